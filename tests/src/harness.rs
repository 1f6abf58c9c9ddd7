//! # Validator Network Harness
//!
//! Drives several [`SideTxApp`] instances through the proposal phases the
//! way the replication engine does:
//!
//! ```text
//! proposer: PrepareProposal(h)
//! all:      ProcessProposal(h) → ExtendVote(h) → VerifyVoteExtension(h, peers)
//! all:      FinalizeBlock(h) → Commit
//! ```
//!
//! Every validator owns its store. The child chain, root chain and
//! validator set are shared, so honest validators see the same world.

use shared_crypto::{sha256, Secp256k1KeyPair};
use shared_types::{
    Address, BlockIdFlag, CommitInfo, ExtendedCommitInfo, ExtendedVoteInfo, Hash, Msg,
    ProposalStatus, RequestExtendVote, RequestFinalizeBlock, RequestPrepareProposal,
    RequestProcessProposal, RequestVerifyVoteExtension, ResponseFinalizeBlock, Tx, Validator,
    ValidatorSet, VerifyStatus, VoteExtension, VoteInfo, VoteValidator,
};
use std::fmt::Debug;
use std::sync::Arc;
use sv_01_state_store::{KvStore, MemStore};
use sv_02_side_tx::SideTxRegistry;
use sv_03_vote_extension::{
    decode_vote_extension, encode_commit_info, encode_vote_extension, sign_extension,
};
use sv_05_checkpoint::adapters::{InMemoryChildChain, InMemoryRootChain, StaticValidatorSet};
use sv_05_checkpoint::{
    keeper, CheckpointModule, GenesisState as CheckpointGenesis, MsgCheckpoint, MsgCpAck,
    MsgCpNoAck, Params as CheckpointParams, MSG_CHECKPOINT, MSG_CP_ACK, MSG_CP_NO_ACK,
};
use sv_06_milestone::{
    GenesisState as MilestoneGenesis, MilestoneService, Params as MilestoneParams, Span,
};
use sv_07_lifecycle::{LifecycleConfig, LifecycleError, SideTxApp};
use thiserror::Error;

pub const CHAIN_ID: &str = "sidechain-it";
pub const BOR_CHAIN_ID: &str = "15001";
pub const POWER: i64 = 10;
pub const GENESIS_TIME: u64 = 1_000;
/// Checkpoint buffer time in seconds.
pub const BUFFER_TIME: u64 = 100;
pub const MAX_TX_BYTES: i64 = 1 << 20;

// =============================================================================
// NETWORK
// =============================================================================

pub struct Peer {
    pub key: Secp256k1KeyPair,
    pub app: SideTxApp,
}

impl Peer {
    pub fn address(&self) -> Address {
        self.key.address()
    }
}

#[derive(Debug, Error)]
pub enum HeightError {
    #[error("proposer could not prepare: {0}")]
    Prepare(LifecycleError),

    #[error("validator {validator} rejected the proposal")]
    Rejected { validator: usize },

    #[error("validator {validator} could not extend its vote: {source}")]
    Extend {
        validator: usize,
        source: LifecycleError,
    },

    #[error("validator {validator} failed to finalize: {source}")]
    Finalize {
        validator: usize,
        source: LifecycleError,
    },
}

/// What one height produced.
#[derive(Debug)]
pub struct HeightOutcome {
    pub height: i64,
    pub time: u64,
    pub proposal: Vec<Vec<u8>>,
    /// Extensions as signed, by validator index.
    pub extensions: Vec<VoteExtension>,
    pub non_rp: Vec<Vec<u8>>,
    /// `(verifier, voter)` pairs where verification failed.
    pub verify_rejections: Vec<(usize, usize)>,
    /// FinalizeBlock responses by validator index.
    pub finalized: Vec<ResponseFinalizeBlock>,
}

impl HeightOutcome {
    /// Position of `tx` in the proposal.
    pub fn index_of(&self, tx: &[u8]) -> Option<usize> {
        self.proposal.iter().position(|t| t.as_slice() == tx)
    }

    /// Result code of `tx` on the first validator.
    pub fn code_of(&self, tx: &[u8]) -> Option<u32> {
        let index = self.index_of(tx)?;
        Some(self.finalized[0].tx_results[index].code)
    }
}

pub struct Network {
    pub peers: Vec<Peer>,
    pub set: ValidatorSet,
    pub child: Arc<InMemoryChildChain>,
    pub root: Arc<InMemoryRootChain>,
    pub checkpoints: Arc<CheckpointModule>,
    span_producer: Address,
    height: i64,
    time: u64,
    last_commit: ExtendedCommitInfo,
}

impl Network {
    /// `size` validators of equal power with genesis loaded.
    pub fn new(size: u8) -> Self {
        let keys: Vec<Secp256k1KeyPair> = (1..=size)
            .map(|i| Secp256k1KeyPair::from_bytes([i; 32]).expect("valid secret"))
            .collect();
        let set = ValidatorSet::new(
            keys.iter()
                .map(|k| Validator::new(k.address(), k.public_key().as_bytes().to_vec(), POWER))
                .collect(),
        );

        let child = Arc::new(InMemoryChildChain::new());
        let root = Arc::new(InMemoryRootChain::new());
        let validators = Arc::new(StaticValidatorSet::new(set.clone()));
        let checkpoints = Arc::new(CheckpointModule::new(
            child.clone(),
            root.clone(),
            validators.clone(),
        ));
        let mut registry = SideTxRegistry::new();
        checkpoints
            .clone()
            .register(&mut registry)
            .expect("checkpoint routes register");
        let registry = Arc::new(registry);
        let milestones = Arc::new(MilestoneService::new(child.clone()));
        let span_producer = set.validators()[0].address;

        let peers = keys
            .into_iter()
            .map(|key| {
                let mut app = SideTxApp::new(
                    config(),
                    Box::new(MemStore::new()),
                    registry.clone(),
                    checkpoints.clone(),
                    milestones.clone(),
                    validators.clone(),
                );
                load_genesis(&mut app, &set, span_producer);
                Peer { key, app }
            })
            .collect();

        Self {
            peers,
            set,
            child,
            root,
            checkpoints,
            span_producer,
            height: 0,
            time: GENESIS_TIME,
            last_commit: ExtendedCommitInfo::default(),
        }
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.time += secs;
    }

    /// Append child blocks authored by the current span producer.
    pub fn extend_child_chain(&self, count: u64) {
        self.child.extend(count, self.span_producer, 0);
    }

    pub fn store(&self, index: usize) -> &dyn KvStore {
        self.peers[index].app.store()
    }

    /// Read `f` from every validator's store, assert they agree and return
    /// the common value.
    pub fn agreed<T: PartialEq + Debug>(&self, f: impl Fn(&dyn KvStore) -> T) -> T {
        let mut values: Vec<T> = self.peers.iter().map(|p| f(p.app.store())).collect();
        let first = values.remove(0);
        for (i, value) in values.iter().enumerate() {
            assert_eq!(&first, value, "validator {} diverged", i + 1);
        }
        first
    }

    pub fn peer_index(&self, address: &Address) -> usize {
        self.peers
            .iter()
            .position(|p| &p.address() == address)
            .expect("address belongs to the network")
    }

    /// Current checkpoint proposer.
    pub fn checkpoint_proposer(&self) -> Address {
        self.agreed(|store| keeper::current_proposer(store, &self.set).expect("store readable"))
            .expect("rotation seeded at genesis")
    }

    /// Proposer `steps` rotations ahead of the current one.
    pub fn proposer_after(&self, steps: u64) -> Address {
        keeper::rotation(self.store(0), &self.set)
            .expect("store readable")
            .peek(&self.set, steps)
            .expect("non-empty set")
    }

    /// Extended commit the next proposal will carry.
    pub fn last_commit_mut(&mut self) -> &mut ExtendedCommitInfo {
        &mut self.last_commit
    }

    pub fn encoded_last_commit(&self) -> Vec<u8> {
        encode_commit_info(&self.last_commit).expect("commit encodes")
    }

    /// Run ProcessProposal for a hand-built proposal of the next height on
    /// every validator, without advancing the chain.
    pub fn process_everywhere(&mut self, proposal: Vec<Vec<u8>>) -> Vec<ProposalStatus> {
        let height = self.height + 1;
        let time = self.time + 1;
        let last_commit = commit_info(&self.last_commit);
        self.peers
            .iter_mut()
            .map(|peer| {
                peer.app
                    .process_proposal(&RequestProcessProposal {
                        txs: proposal.clone(),
                        proposed_last_commit: last_commit.clone(),
                        hash: block_hash(height),
                        height,
                        time,
                        ..Default::default()
                    })
                    .status
            })
            .collect()
    }

    pub fn run_height(&mut self, txs: Vec<Vec<u8>>) -> Result<HeightOutcome, HeightError> {
        self.run_height_with(txs, |_, _, _| {})
    }

    /// Run one height; `rewrite` may change a validator's vote before it
    /// signs, simulating a validator that saw a different world.
    pub fn run_height_with(
        &mut self,
        txs: Vec<Vec<u8>>,
        mut rewrite: impl FnMut(usize, &mut VoteExtension, &mut Vec<u8>),
    ) -> Result<HeightOutcome, HeightError> {
        let height = self.height + 1;
        let time = self.time + 1;
        let hash = block_hash(height);
        let proposer = (height as usize - 1) % self.peers.len();
        let proposer_address = self.peers[proposer].address();
        let last_commit = commit_info(&self.last_commit);

        // ===== PREPARE =====
        let proposal = self.peers[proposer]
            .app
            .prepare_proposal(&RequestPrepareProposal {
                max_tx_bytes: MAX_TX_BYTES,
                txs,
                local_last_commit: self.last_commit.clone(),
                height,
                time,
                proposer_address,
            })
            .map_err(HeightError::Prepare)?
            .txs;

        // ===== PROCESS =====
        for (validator, peer) in self.peers.iter_mut().enumerate() {
            let status = peer
                .app
                .process_proposal(&RequestProcessProposal {
                    txs: proposal.clone(),
                    proposed_last_commit: last_commit.clone(),
                    hash: hash.clone(),
                    height,
                    time,
                    proposer_address,
                })
                .status;
            if status != ProposalStatus::Accept {
                return Err(HeightError::Rejected { validator });
            }
        }

        // ===== EXTEND =====
        let mut votes = Vec::with_capacity(self.peers.len());
        let mut extensions = Vec::with_capacity(self.peers.len());
        let mut non_rps = Vec::with_capacity(self.peers.len());
        for (validator, peer) in self.peers.iter_mut().enumerate() {
            let response = peer
                .app
                .extend_vote(&RequestExtendVote {
                    hash: hash.clone(),
                    height,
                    time,
                    txs: proposal.clone(),
                    proposed_last_commit: last_commit.clone(),
                    proposer_address,
                })
                .map_err(|source| HeightError::Extend { validator, source })?;

            let mut extension =
                decode_vote_extension(&response.vote_extension).expect("own extension decodes");
            let mut non_rp = response.non_rp_extension;
            rewrite(validator, &mut extension, &mut non_rp);

            let bytes = encode_vote_extension(&extension).expect("extension encodes");
            let (signature, non_rp_signature) =
                sign_extension(&peer.key, &bytes, &non_rp, height, 0, CHAIN_ID);
            votes.push(ExtendedVoteInfo {
                validator: VoteValidator {
                    address: peer.address(),
                    power: POWER,
                },
                vote_extension: bytes,
                extension_signature: signature,
                non_rp_vote_extension: non_rp.clone(),
                non_rp_extension_signature: non_rp_signature,
                block_id_flag: BlockIdFlag::Commit,
            });
            extensions.push(extension);
            non_rps.push(non_rp);
        }

        // ===== VERIFY =====
        let mut verify_rejections = Vec::new();
        for (verifier, peer) in self.peers.iter_mut().enumerate() {
            for (voter, vote) in votes.iter().enumerate() {
                if voter == verifier {
                    continue;
                }
                let status = peer
                    .app
                    .verify_vote_extension(&RequestVerifyVoteExtension {
                        hash: hash.clone(),
                        validator_address: vote.validator.address,
                        height,
                        vote_extension: vote.vote_extension.clone(),
                        non_rp_vote_extension: vote.non_rp_vote_extension.clone(),
                    })
                    .status;
                if status != VerifyStatus::Accept {
                    verify_rejections.push((verifier, voter));
                }
            }
        }
        // A precommit whose extension was rejected never reaches the commit.
        for &(_, voter) in &verify_rejections {
            let vote = &mut votes[voter];
            *vote = ExtendedVoteInfo {
                validator: vote.validator,
                vote_extension: Vec::new(),
                extension_signature: Vec::new(),
                non_rp_vote_extension: Vec::new(),
                non_rp_extension_signature: Vec::new(),
                block_id_flag: BlockIdFlag::Absent,
            };
        }

        // ===== FINALIZE + COMMIT =====
        let mut finalized = Vec::with_capacity(self.peers.len());
        for (validator, peer) in self.peers.iter_mut().enumerate() {
            let response = peer
                .app
                .finalize_block(&RequestFinalizeBlock {
                    txs: proposal.clone(),
                    decided_last_commit: last_commit.clone(),
                    hash: hash.clone(),
                    height,
                    time,
                    proposer_address,
                })
                .map_err(|source| HeightError::Finalize { validator, source })?;
            peer.app
                .commit()
                .map_err(|source| HeightError::Finalize { validator, source })?;
            finalized.push(response);
        }

        self.height = height;
        self.time = time;
        self.last_commit = ExtendedCommitInfo { round: 0, votes };

        Ok(HeightOutcome {
            height,
            time,
            proposal,
            extensions,
            non_rp: non_rps,
            verify_rejections,
            finalized,
        })
    }
}

fn config() -> LifecycleConfig {
    LifecycleConfig {
        chain_id: CHAIN_ID.to_string(),
        vote_extensions_enable_height: 1,
        max_tx_bytes: MAX_TX_BYTES,
    }
}

fn load_genesis(app: &mut SideTxApp, set: &ValidatorSet, span_producer: Address) {
    let checkpoint = CheckpointGenesis {
        params: CheckpointParams {
            checkpoint_buffer_time: BUFFER_TIME,
            bor_chain_id: BOR_CHAIN_ID.to_string(),
            ..Default::default()
        },
        chain_start_time: GENESIS_TIME,
        ..Default::default()
    };
    sv_05_checkpoint::init_genesis(app.store_mut(), &checkpoint, set).expect("checkpoint genesis");

    let params = MilestoneParams {
        bor_chain_id: BOR_CHAIN_ID.to_string(),
        ..Default::default()
    };
    let milestone = MilestoneGenesis {
        spans: vec![Span {
            id: 0,
            start_block: 0,
            end_block: params.span_length - 1,
            producer: span_producer,
        }],
        params,
    };
    sv_06_milestone::init_genesis(app.store_mut(), &milestone).expect("milestone genesis");
}

fn commit_info(commit: &ExtendedCommitInfo) -> CommitInfo {
    CommitInfo {
        round: commit.round,
        votes: commit
            .votes
            .iter()
            .map(|v| VoteInfo {
                validator: v.validator,
                block_id_flag: v.block_id_flag,
            })
            .collect(),
    }
}

pub fn block_hash(height: i64) -> Vec<u8> {
    sha256(&height.to_be_bytes()).to_vec()
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

fn encode_tx(msg: Msg, signer: Address, nonce: u64) -> Vec<u8> {
    Tx::new(vec![msg], signer, nonce).encode().expect("tx encodes")
}

pub fn checkpoint_tx(proposer: Address, start: u64, end: u64, root_hash: Hash) -> Vec<u8> {
    let msg = MsgCheckpoint {
        proposer,
        start_block: start,
        end_block: end,
        root_hash,
        bor_chain_id: BOR_CHAIN_ID.to_string(),
    };
    encode_tx(Msg::pack(MSG_CHECKPOINT, &msg).expect("msg packs"), proposer, start)
}

/// Ack of checkpoint `number`, plus the root-chain event it points at.
pub fn ack_tx(from: Address, msg: MsgCpAck) -> Vec<u8> {
    let nonce = msg.number;
    encode_tx(Msg::pack(MSG_CP_ACK, &msg).expect("msg packs"), from, nonce)
}

pub fn no_ack_tx(from: Address, nonce: u64) -> Vec<u8> {
    let msg = MsgCpNoAck { from };
    encode_tx(Msg::pack(MSG_CP_NO_ACK, &msg).expect("msg packs"), from, nonce)
}
