//! # Replication-Engine Interface Types
//!
//! Request/response types for the ABCI++ proposal and vote-extension
//! extension points, plus the extended-commit data the engine hands back one
//! height later. The engine produces these; the lifecycle controller only
//! reads them.

use crate::entities::Address;
use serde::{Deserialize, Serialize};

/// Whether a validator's precommit for the block was received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockIdFlag {
    #[default]
    Unknown,
    Absent,
    Commit,
    Nil,
}

/// Validator identity and power as recorded by the engine for a vote.
///
/// `power` is the voting power at the height the vote was cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteValidator {
    pub address: Address,
    pub power: i64,
}

/// One validator's precommit with both extension channels.
///
/// Never mutated after signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedVoteInfo {
    pub validator: VoteValidator,
    pub vote_extension: Vec<u8>,
    pub extension_signature: Vec<u8>,
    pub non_rp_vote_extension: Vec<u8>,
    pub non_rp_extension_signature: Vec<u8>,
    pub block_id_flag: BlockIdFlag,
}

/// Extended commit of the previous height, embedded as tx 0 of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtendedCommitInfo {
    pub round: i32,
    pub votes: Vec<ExtendedVoteInfo>,
}

/// Precommit without extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInfo {
    pub validator: VoteValidator,
    pub block_id_flag: BlockIdFlag,
}

/// Commit info without extensions, as carried by process/finalize requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitInfo {
    pub round: i32,
    pub votes: Vec<VoteInfo>,
}

/// Key/value attribute of an emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

/// A typed event emitted during block processing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    /// Builder-style attribute append.
    pub fn attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    /// Look up the first attribute with `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

// =============================================================================
// PREPARE / PROCESS PROPOSAL
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RequestPrepareProposal {
    pub max_tx_bytes: i64,
    /// Candidate transactions from the mempool, in mempool order.
    pub txs: Vec<Vec<u8>>,
    pub local_last_commit: ExtendedCommitInfo,
    pub height: i64,
    /// Block time in unix seconds.
    pub time: u64,
    pub proposer_address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponsePrepareProposal {
    pub txs: Vec<Vec<u8>>,
    /// Latest execution payload produced in the background; empty when none
    /// was available.
    pub execution_payload: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestProcessProposal {
    pub txs: Vec<Vec<u8>>,
    pub proposed_last_commit: CommitInfo,
    pub hash: Vec<u8>,
    pub height: i64,
    pub time: u64,
    pub proposer_address: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseProcessProposal {
    pub status: ProposalStatus,
}

impl ResponseProcessProposal {
    pub fn accept() -> Self {
        Self {
            status: ProposalStatus::Accept,
        }
    }

    pub fn reject() -> Self {
        Self {
            status: ProposalStatus::Reject,
        }
    }
}

// =============================================================================
// EXTEND / VERIFY VOTE EXTENSION
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RequestExtendVote {
    pub hash: Vec<u8>,
    pub height: i64,
    pub time: u64,
    pub txs: Vec<Vec<u8>>,
    pub proposed_last_commit: CommitInfo,
    pub proposer_address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseExtendVote {
    pub vote_extension: Vec<u8>,
    pub non_rp_extension: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestVerifyVoteExtension {
    pub hash: Vec<u8>,
    pub validator_address: Address,
    pub height: i64,
    pub vote_extension: Vec<u8>,
    pub non_rp_vote_extension: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseVerifyVoteExtension {
    pub status: VerifyStatus,
}

impl ResponseVerifyVoteExtension {
    pub fn accept() -> Self {
        Self {
            status: VerifyStatus::Accept,
        }
    }

    pub fn reject() -> Self {
        Self {
            status: VerifyStatus::Reject,
        }
    }
}

// =============================================================================
// FINALIZE BLOCK
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RequestFinalizeBlock {
    pub txs: Vec<Vec<u8>>,
    pub decided_last_commit: CommitInfo,
    pub hash: Vec<u8>,
    pub height: i64,
    pub time: u64,
    pub proposer_address: Address,
}

/// Result of delivering one transaction. `code == 0` means success.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecTxResult {
    pub code: u32,
    pub codespace: String,
    pub log: String,
    pub events: Vec<Event>,
}

impl ExecTxResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFinalizeBlock {
    /// Events emitted by the pre-block phase (post handlers, milestones).
    pub events: Vec<Event>,
    pub tx_results: Vec<ExecTxResult>,
}
