//! The application the replication engine drives.

use crate::config::LifecycleConfig;
use crate::error::LifecycleResult;
use crate::payload::{PayloadAttributes, PayloadHandle};
use shared_types::{
    Address, RequestExtendVote, RequestFinalizeBlock, RequestPrepareProposal,
    RequestProcessProposal, RequestVerifyVoteExtension, ResponseExtendVote,
    ResponseFinalizeBlock, ResponsePrepareProposal, ResponseProcessProposal,
    ResponseVerifyVoteExtension,
};
use std::sync::Arc;
use sv_01_state_store::{get_typed, put_typed, BlockHeader, Context, KvStore};
use sv_02_side_tx::SideTxRegistry;
use sv_03_vote_extension::NonRpVerifier;
use sv_05_checkpoint::ValidatorSetProvider;
use sv_06_milestone::MilestoneService;
use sv_telemetry::LAST_FINALIZED_HEIGHT;
use tracing::info;

/// Raw txs of the last finalized block, read back by the next PreBlock.
pub const LAST_BLOCK_TXS_KEY: &[u8] = &[0x20];
pub const LAST_COMMITTED_HEIGHT_KEY: &[u8] = &[0x21];

/// Collaborators shared by every handler.
pub(crate) struct Services {
    pub(crate) config: LifecycleConfig,
    pub(crate) registry: Arc<SideTxRegistry>,
    pub(crate) non_rp: Arc<dyn NonRpVerifier>,
    pub(crate) milestones: Arc<MilestoneService>,
    pub(crate) validators: Arc<dyn ValidatorSetProvider>,
    pub(crate) payload: Option<PayloadHandle>,
}

/// Side-tx application.
///
/// Handlers run one at a time, in the order the engine calls them. Only
/// `finalize_block` and `commit` write state; every other phase runs on a
/// cache that is discarded.
pub struct SideTxApp {
    store: Box<dyn KvStore>,
    services: Services,
    /// Height finalized but not yet committed.
    pending: Option<(i64, PayloadAttributes)>,
}

impl SideTxApp {
    pub fn new(
        config: LifecycleConfig,
        store: Box<dyn KvStore>,
        registry: Arc<SideTxRegistry>,
        non_rp: Arc<dyn NonRpVerifier>,
        milestones: Arc<MilestoneService>,
        validators: Arc<dyn ValidatorSetProvider>,
    ) -> Self {
        Self {
            store,
            services: Services {
                config,
                registry,
                non_rp,
                milestones,
                validators,
                payload: None,
            },
            pending: None,
        }
    }

    /// Attach the execution payload producer.
    pub fn with_payload(mut self, handle: PayloadHandle) -> Self {
        self.services.payload = Some(handle);
        self
    }

    pub fn payload(&self) -> Option<&PayloadHandle> {
        self.services.payload.as_ref()
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.services.config
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    /// Direct store access, for genesis and queries.
    pub fn store_mut(&mut self) -> &mut dyn KvStore {
        self.store.as_mut()
    }

    fn header(&self, height: i64, time: u64, hash: &[u8], proposer: Address) -> BlockHeader {
        BlockHeader {
            height,
            time,
            chain_id: self.services.config.chain_id.clone(),
            hash: hash.to_vec(),
            proposer,
        }
    }

    pub fn prepare_proposal(
        &mut self,
        req: &RequestPrepareProposal,
    ) -> LifecycleResult<ResponsePrepareProposal> {
        let header = self.header(req.height, req.time, &[], req.proposer_address);
        let mut ctx = Context::new(header, self.store.as_mut());
        self.services.prepare_proposal(&mut ctx, req)
    }

    pub fn process_proposal(&mut self, req: &RequestProcessProposal) -> ResponseProcessProposal {
        let header = self.header(req.height, req.time, &req.hash, req.proposer_address);
        let mut ctx = Context::new(header, self.store.as_mut());
        self.services.process_proposal(&mut ctx, req)
    }

    pub fn extend_vote(&mut self, req: &RequestExtendVote) -> LifecycleResult<ResponseExtendVote> {
        let header = self.header(req.height, req.time, &req.hash, req.proposer_address);
        let mut ctx = Context::new(header, self.store.as_mut());
        self.services.extend_vote(&mut ctx, req)
    }

    pub fn verify_vote_extension(
        &mut self,
        req: &RequestVerifyVoteExtension,
    ) -> ResponseVerifyVoteExtension {
        let header = self.header(req.height, 0, &req.hash, req.validator_address);
        let mut ctx = Context::new(header, self.store.as_mut());
        self.services.verify_vote_extension(&mut ctx, req)
    }

    /// PreBlock followed by delivery of the block's transactions.
    ///
    /// All writes of the block land together; a `Fatal` error leaves the
    /// store untouched.
    pub fn finalize_block(
        &mut self,
        req: &RequestFinalizeBlock,
    ) -> LifecycleResult<ResponseFinalizeBlock> {
        let header = self.header(req.height, req.time, &req.hash, req.proposer_address);
        let mut ctx = Context::new(header, self.store.as_mut());
        let services = &self.services;
        let response = ctx.with_cache(|block| services.finalize_block(block, req))?;

        self.pending = Some((
            req.height,
            PayloadAttributes {
                height: req.height + 1,
                timestamp: req.time,
                parent_hash: req.hash.clone(),
            },
        ));
        Ok(response)
    }

    /// Record the finalized height and start building the next payload.
    pub fn commit(&mut self) -> LifecycleResult<i64> {
        let Some((height, next)) = self.pending.take() else {
            return self.last_committed_height();
        };
        put_typed(self.store.as_mut(), LAST_COMMITTED_HEIGHT_KEY, &height)?;
        LAST_FINALIZED_HEIGHT.set(height as f64);
        info!(height, "[sv-07] committed block");

        if let Some(payload) = &self.services.payload {
            payload.request(next);
        }
        Ok(height)
    }

    pub fn last_committed_height(&self) -> LifecycleResult<i64> {
        Ok(get_typed(self.store.as_ref(), LAST_COMMITTED_HEIGHT_KEY)?.unwrap_or(0))
    }
}
