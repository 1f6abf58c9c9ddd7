//! # Checkpoint Module
//!
//! Implements the side-tx handler traits for checkpoint messages.
//!
//! | Message | Side handler | Post handler | Msg handler |
//! |---------|--------------|--------------|-------------|
//! | `MsgCheckpoint` | root hash vs child chain | buffer | stateless checks |
//! | `MsgCpAck` | event vs root chain | commit buffered | stateless checks |
//! | `MsgCpNoAck` | - | - | rotate proposer |
//!
//! Side handlers read state but never write it; every external query
//! failure is a `No` vote.

use crate::domain::{
    checkpoint_sign_bytes, parse_checkpoint_sign_bytes, Checkpoint, MsgCheckpoint, MsgCpAck,
    MsgCpNoAck, Params, MSG_CHECKPOINT, MSG_CP_ACK, MSG_CP_NO_ACK,
};
use crate::error::{CheckpointError, CheckpointResult};
use crate::events;
use crate::keeper;
use crate::ports::{ChildChainClient, QueryError, RootChainClient, ValidatorSetProvider};
use shared_crypto::keccak256;
use shared_types::{to_hex, Address, Msg, ValidatorSet, Vote};
use std::sync::Arc;
use sv_01_state_store::{Context, KvStore};
use sv_02_side_tx::{
    HandlerError, MsgHandler, PostMsgHandler, RegistryResult, SideMsgHandler, SideTxRegistry,
};
use sv_03_vote_extension::{NonRpError, NonRpVerifier, CHECKPOINT_NON_RP_PREFIX};
use sv_telemetry::{metric_inc, CHECKPOINTS_ACKED, CHECKPOINT_NO_ACKS};
use tracing::{debug, info, warn};

/// Checkpoint side-tx module.
pub struct CheckpointModule {
    child: Arc<dyn ChildChainClient>,
    root: Arc<dyn RootChainClient>,
    validators: Arc<dyn ValidatorSetProvider>,
}

impl CheckpointModule {
    pub fn new(
        child: Arc<dyn ChildChainClient>,
        root: Arc<dyn RootChainClient>,
        validators: Arc<dyn ValidatorSetProvider>,
    ) -> Self {
        Self {
            child,
            root,
            validators,
        }
    }

    /// Register every checkpoint route.
    pub fn register(self: Arc<Self>, registry: &mut SideTxRegistry) -> RegistryResult<()> {
        registry.register_side_handler(MSG_CHECKPOINT, self.clone())?;
        registry.register_side_handler(MSG_CP_ACK, self.clone())?;
        registry.register_post_handler(MSG_CHECKPOINT, self.clone())?;
        registry.register_post_handler(MSG_CP_ACK, self.clone())?;
        registry.register_msg_handler(MSG_CHECKPOINT, self.clone())?;
        registry.register_msg_handler(MSG_CP_ACK, self.clone())?;
        registry.register_msg_handler(MSG_CP_NO_ACK, self)?;
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn last_checkpoint(&self, store: &dyn KvStore) -> CheckpointResult<Option<Checkpoint>> {
        Ok(keeper::last_checkpoint(store)?)
    }

    pub fn checkpoint_by_id(
        &self,
        store: &dyn KvStore,
        id: u64,
    ) -> CheckpointResult<Option<Checkpoint>> {
        Ok(keeper::checkpoint_by_id(store, id)?)
    }

    pub fn buffered_checkpoint(&self, store: &dyn KvStore) -> CheckpointResult<Option<Checkpoint>> {
        Ok(keeper::buffered_checkpoint(store)?)
    }

    pub fn ack_count(&self, store: &dyn KvStore) -> CheckpointResult<u64> {
        Ok(keeper::ack_count(store)?)
    }

    pub fn last_no_ack(&self, store: &dyn KvStore) -> CheckpointResult<u64> {
        Ok(keeper::last_no_ack(store)?)
    }

    /// Checkpoint proposer under the validator set at `height`.
    pub fn current_proposer(
        &self,
        store: &dyn KvStore,
        height: i64,
    ) -> CheckpointResult<Option<Address>> {
        let set = self.validator_set(height)?;
        Ok(keeper::current_proposer(store, &set)?)
    }

    fn validator_set(&self, height: i64) -> CheckpointResult<ValidatorSet> {
        self.validators
            .validator_set(height)
            .ok_or(CheckpointError::ValidatorSetUnavailable { height })
    }

    // =========================================================================
    // SIDE HANDLERS
    // =========================================================================

    fn side_checkpoint(&self, ctx: &Context<'_>, msg: &MsgCheckpoint) -> CheckpointResult<Vote> {
        let params = keeper::params(ctx.store())?;
        if let Err(e) = check_chain_id(&params, &msg.bor_chain_id)
            .and_then(|_| check_length(&params, msg.start_block, msg.end_block))
            .and_then(|_| check_continuity(ctx.store(), msg.start_block))
        {
            debug!(error = %e, "[sv-05] checkpoint fails local checks");
            return Ok(Vote::No);
        }

        match self.child.check_blocks_exist(msg.end_block) {
            Ok(true) => {}
            Ok(false) => {
                debug!(end_block = msg.end_block, "[sv-05] checkpoint end block not on child chain yet");
                return Ok(Vote::No);
            }
            Err(e) => {
                warn!(error = %e, "[sv-05] child chain query failed");
                return Ok(Vote::No);
            }
        }

        match self.child.get_root_hash(msg.start_block, msg.end_block) {
            Ok(root) if root == msg.root_hash => Ok(Vote::Yes),
            Ok(root) => {
                warn!(
                    expected = %to_hex(&root),
                    proposed = %to_hex(&msg.root_hash),
                    "[sv-05] checkpoint root hash mismatch"
                );
                Ok(Vote::No)
            }
            Err(e) => {
                warn!(error = %e, "[sv-05] child chain query failed");
                Ok(Vote::No)
            }
        }
    }

    fn side_ack(&self, ctx: &Context<'_>, msg: &MsgCpAck) -> CheckpointResult<Vote> {
        let Some(buffered) = keeper::buffered_checkpoint(ctx.store())? else {
            debug!(number = msg.number, "[sv-05] ack without buffered checkpoint");
            return Ok(Vote::No);
        };
        if buffered.start_block != msg.start_block {
            debug!(
                buffered = buffered.start_block,
                acked = msg.start_block,
                "[sv-05] ack start block differs from buffer"
            );
            return Ok(Vote::No);
        }

        match self.root.get_checkpoint_event(&msg.tx_hash, msg.log_index) {
            Ok(event) if event.matches(msg) => Ok(Vote::Yes),
            Ok(event) => {
                warn!(
                    number = event.number,
                    end_block = event.end_block,
                    "[sv-05] root chain event does not match ack"
                );
                Ok(Vote::No)
            }
            Err(e) => {
                warn!(error = %e, "[sv-05] root chain query failed");
                Ok(Vote::No)
            }
        }
    }

    // =========================================================================
    // POST HANDLERS
    // =========================================================================

    fn post_checkpoint(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgCheckpoint,
        vote: Vote,
    ) -> CheckpointResult<()> {
        let now = ctx.block_time();
        let params = keeper::params(ctx.store())?;
        let checkpoint = Checkpoint {
            id: keeper::ack_count(ctx.store())? + 1,
            proposer: msg.proposer,
            start_block: msg.start_block,
            end_block: msg.end_block,
            root_hash: msg.root_hash,
            bor_chain_id: msg.bor_chain_id.clone(),
            timestamp: now,
        };
        let tx_hash = ctx.tx_hash().to_vec();

        if vote != Vote::Yes {
            debug!(vote = %vote, "[sv-05] checkpoint not approved, skipping");
            ctx.emit(events::checkpoint_event(&tx_hash, vote, &checkpoint));
            return Ok(());
        }

        if let Some(buffered) = keeper::buffered_checkpoint(ctx.store())? {
            let expires_at = buffered.timestamp.saturating_add(params.checkpoint_buffer_time);
            if now <= expires_at {
                return Err(CheckpointError::BufferOccupied { expires_at });
            }
            info!(
                start_block = buffered.start_block,
                end_block = buffered.end_block,
                "[sv-05] flushing expired checkpoint buffer"
            );
            keeper::clear_buffer(ctx.store_mut())?;
        }
        check_continuity(ctx.store(), msg.start_block)?;

        keeper::set_buffer(ctx.store_mut(), &checkpoint)?;
        info!(
            id = checkpoint.id,
            start_block = checkpoint.start_block,
            end_block = checkpoint.end_block,
            "[sv-05] checkpoint buffered"
        );
        ctx.emit(events::checkpoint_event(&tx_hash, vote, &checkpoint));
        Ok(())
    }

    fn post_ack(&self, ctx: &mut Context<'_>, msg: &MsgCpAck, vote: Vote) -> CheckpointResult<()> {
        let now = ctx.block_time();
        let tx_hash = ctx.tx_hash().to_vec();

        if vote != Vote::Yes {
            let params = keeper::params(ctx.store())?;
            let claimed = Checkpoint {
                id: msg.number,
                proposer: msg.proposer,
                start_block: msg.start_block,
                end_block: msg.end_block,
                root_hash: msg.root_hash,
                bor_chain_id: params.bor_chain_id,
                timestamp: now,
            };
            debug!(vote = %vote, number = msg.number, "[sv-05] ack not approved, skipping");
            ctx.emit(events::checkpoint_ack_event(&tx_hash, vote, &claimed));
            return Ok(());
        }

        let mut checkpoint = keeper::buffered_checkpoint(ctx.store())?
            .ok_or(CheckpointError::NoBufferedCheckpoint)?;
        let expected = keeper::ack_count(ctx.store())? + 1;
        if msg.number != expected {
            return Err(CheckpointError::InvalidAckNumber {
                expected,
                actual: msg.number,
            });
        }

        // The root chain is authoritative for what was actually submitted.
        if checkpoint.end_block != msg.end_block || checkpoint.root_hash != msg.root_hash {
            info!(
                buffered_end = checkpoint.end_block,
                confirmed_end = msg.end_block,
                "[sv-05] replacing buffered checkpoint with root-chain confirmed values"
            );
            checkpoint.end_block = msg.end_block;
            checkpoint.root_hash = msg.root_hash;
        }
        checkpoint.id = expected;
        checkpoint.timestamp = now;

        let set = self.validator_set(ctx.height())?;
        let store = ctx.store_mut();
        keeper::add_checkpoint(store, &checkpoint)?;
        keeper::set_ack_count(store, expected)?;
        keeper::clear_buffer(store)?;
        let next = keeper::advance_proposer(store, &set, 1)?;

        metric_inc!(CHECKPOINTS_ACKED);
        info!(
            id = checkpoint.id,
            end_block = checkpoint.end_block,
            next_proposer = ?next.map(|a| to_hex(&a)),
            "[sv-05] checkpoint acknowledged"
        );
        ctx.emit(events::checkpoint_ack_event(&tx_hash, vote, &checkpoint));
        Ok(())
    }

    // =========================================================================
    // MSG HANDLERS
    // =========================================================================

    fn handle_checkpoint(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgCheckpoint,
        signer: &Address,
    ) -> CheckpointResult<()> {
        let params = keeper::params(ctx.store())?;
        check_chain_id(&params, &msg.bor_chain_id)?;
        check_length(&params, msg.start_block, msg.end_block)?;

        let set = self.validator_set(ctx.height())?;
        let proposer = keeper::current_proposer(ctx.store(), &set)?;
        if proposer != Some(msg.proposer) || *signer != msg.proposer {
            return Err(CheckpointError::InvalidProposer);
        }

        check_continuity(ctx.store(), msg.start_block)?;
        if let Some(buffered) = keeper::buffered_checkpoint(ctx.store())? {
            let expires_at = buffered.timestamp.saturating_add(params.checkpoint_buffer_time);
            if ctx.block_time() <= expires_at {
                return Err(CheckpointError::BufferOccupied { expires_at });
            }
        }
        Ok(())
    }

    fn handle_ack(&self, ctx: &mut Context<'_>, msg: &MsgCpAck) -> CheckpointResult<()> {
        let buffered = keeper::buffered_checkpoint(ctx.store())?
            .ok_or(CheckpointError::NoBufferedCheckpoint)?;
        let expected = keeper::ack_count(ctx.store())? + 1;
        if msg.number != expected {
            return Err(CheckpointError::InvalidAckNumber {
                expected,
                actual: msg.number,
            });
        }
        if msg.start_block != buffered.start_block {
            return Err(CheckpointError::DiscontinuousCheckpoint {
                expected: buffered.start_block,
                actual: msg.start_block,
            });
        }
        Ok(())
    }

    /// Rotate the checkpoint proposer when no checkpoint landed in time.
    ///
    /// The sender must be the proposer `⌊elapsed / buffer_time⌋` steps ahead
    /// of the current one, and at most one no-ack is accepted per buffer
    /// window.
    fn handle_no_ack(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgCpNoAck,
        signer: &Address,
    ) -> CheckpointResult<()> {
        if *signer != msg.from {
            return Err(CheckpointError::InvalidProposer);
        }

        let now = ctx.block_time();
        let params = keeper::params(ctx.store())?;
        let buffer_time = params.checkpoint_buffer_time.max(1);

        let elapsed = now.saturating_sub(keeper::last_checkpoint_time(ctx.store())?);
        if elapsed <= buffer_time {
            return Err(CheckpointError::InvalidNoAckTiming {
                elapsed,
                buffer_time,
            });
        }

        let set = self.validator_set(ctx.height())?;
        let mut rotation = keeper::rotation(ctx.store(), &set)?;
        let steps = elapsed / buffer_time;
        if rotation.peek(&set, steps) != Some(msg.from) {
            debug!(
                from = %to_hex(&msg.from),
                steps,
                "[sv-05] no-ack from unexpected proposer"
            );
            return Err(CheckpointError::InvalidNoAckProposer);
        }

        let since_no_ack = now.saturating_sub(keeper::last_no_ack(ctx.store())?);
        if since_no_ack <= buffer_time {
            return Err(CheckpointError::TooManyNoAcks {
                elapsed: since_no_ack,
            });
        }

        let next = rotation.advance(&set, 1);
        keeper::set_last_no_ack(ctx.store_mut(), now)?;
        keeper::set_rotation(ctx.store_mut(), &rotation)?;

        metric_inc!(CHECKPOINT_NO_ACKS);
        info!(
            from = %to_hex(&msg.from),
            next_proposer = ?next.map(|a| to_hex(&a)),
            "[sv-05] no-ack accepted, proposer rotated"
        );
        let tx_hash = ctx.tx_hash().to_vec();
        ctx.emit(events::checkpoint_no_ack_event(
            &tx_hash,
            &msg.from,
            &next.unwrap_or_default(),
        ));
        Ok(())
    }
}

fn check_chain_id(params: &Params, bor_chain_id: &str) -> CheckpointResult<()> {
    if bor_chain_id != params.bor_chain_id {
        return Err(CheckpointError::InvalidChainId {
            expected: params.bor_chain_id.clone(),
            actual: bor_chain_id.to_string(),
        });
    }
    Ok(())
}

fn check_length(params: &Params, start: u64, end: u64) -> CheckpointResult<()> {
    if end < start || end - start >= params.max_checkpoint_length {
        return Err(CheckpointError::InvalidLength {
            start,
            end,
            max: params.max_checkpoint_length,
        });
    }
    Ok(())
}

fn check_continuity(store: &dyn KvStore, start: u64) -> CheckpointResult<()> {
    let expected = keeper::next_start_block(store)?;
    if start != expected {
        return Err(CheckpointError::DiscontinuousCheckpoint {
            expected,
            actual: start,
        });
    }
    Ok(())
}

impl SideMsgHandler for CheckpointModule {
    fn side_handler(&self, ctx: &mut Context<'_>, msg: &Msg) -> Vote {
        let result = match msg.type_url.as_str() {
            MSG_CHECKPOINT => msg
                .unpack::<MsgCheckpoint>()
                .map_err(CheckpointError::from)
                .and_then(|m| self.side_checkpoint(ctx, &m)),
            MSG_CP_ACK => msg
                .unpack::<MsgCpAck>()
                .map_err(CheckpointError::from)
                .and_then(|m| self.side_ack(ctx, &m)),
            other => {
                warn!(type_url = other, "[sv-05] side handler called for foreign message");
                return Vote::No;
            }
        };

        match result {
            Ok(vote) => {
                debug!(type_url = %msg.type_url, vote = %vote, "[sv-05] side handler voted");
                vote
            }
            Err(e) => {
                warn!(type_url = %msg.type_url, error = %e, "[sv-05] side handler failed");
                Vote::No
            }
        }
    }

    fn non_rp_sign_bytes(&self, _ctx: &mut Context<'_>, msg: &Msg) -> Option<Vec<u8>> {
        if msg.type_url != MSG_CHECKPOINT {
            return None;
        }
        let checkpoint = msg.unpack::<MsgCheckpoint>().ok()?;
        let mut bytes = vec![CHECKPOINT_NON_RP_PREFIX];
        bytes.extend_from_slice(&checkpoint_sign_bytes(&checkpoint));
        Some(bytes)
    }
}

impl PostMsgHandler for CheckpointModule {
    fn post_handler(
        &self,
        ctx: &mut Context<'_>,
        msg: &Msg,
        vote: Vote,
    ) -> Result<(), HandlerError> {
        let result = match msg.type_url.as_str() {
            MSG_CHECKPOINT => msg
                .unpack::<MsgCheckpoint>()
                .map_err(CheckpointError::from)
                .and_then(|m| self.post_checkpoint(ctx, &m, vote)),
            MSG_CP_ACK => msg
                .unpack::<MsgCpAck>()
                .map_err(CheckpointError::from)
                .and_then(|m| self.post_ack(ctx, &m, vote)),
            other => return Err(HandlerError::unknown_request(other)),
        };
        result.map_err(|e| {
            warn!(type_url = %msg.type_url, error = %e, "[sv-05] post handler failed");
            e.into()
        })
    }
}

impl MsgHandler for CheckpointModule {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Msg, signer: &Address) -> Result<(), HandlerError> {
        let result = match msg.type_url.as_str() {
            MSG_CHECKPOINT => msg
                .unpack::<MsgCheckpoint>()
                .map_err(CheckpointError::from)
                .and_then(|m| self.handle_checkpoint(ctx, &m, signer)),
            MSG_CP_ACK => msg
                .unpack::<MsgCpAck>()
                .map_err(CheckpointError::from)
                .and_then(|m| self.handle_ack(ctx, &m)),
            MSG_CP_NO_ACK => msg
                .unpack::<MsgCpNoAck>()
                .map_err(CheckpointError::from)
                .and_then(|m| self.handle_no_ack(ctx, &m, signer)),
            other => return Err(HandlerError::unknown_request(other)),
        };
        result.map_err(|e| {
            debug!(type_url = %msg.type_url, error = %e, "[sv-05] message rejected");
            e.into()
        })
    }
}

impl NonRpVerifier for CheckpointModule {
    fn verify(&self, ctx: &Context<'_>, payload: &[u8]) -> Result<(), NonRpError> {
        let data = parse_checkpoint_sign_bytes(payload)
            .ok_or_else(|| NonRpError::Invalid("malformed checkpoint sign bytes".to_string()))?;

        let params = keeper::params(ctx.store())
            .map_err(|e| NonRpError::Unavailable(format!("checkpoint params: {e}")))?;
        if data.chain_id_hash != keccak256(params.bor_chain_id.as_bytes()) {
            return Err(NonRpError::Invalid("checkpoint for another chain id".to_string()));
        }

        // A lagging child chain cannot judge the checkpoint either way.
        match self.child.check_blocks_exist(data.end_block) {
            Ok(true) => {}
            Ok(false) => {
                return Err(NonRpError::Unavailable(format!(
                    "child block {} not synced",
                    data.end_block
                )))
            }
            Err(e) => return Err(NonRpError::Unavailable(e.to_string())),
        }

        let root = self
            .child
            .get_root_hash(data.start_block, data.end_block)
            .map_err(|e| match e {
                QueryError::Unavailable(reason) => NonRpError::Unavailable(reason),
                QueryError::Invalid(reason) => NonRpError::Invalid(reason),
            })?;
        if root != data.root_hash {
            return Err(NonRpError::Invalid(format!(
                "root hash mismatch for blocks {}..={}",
                data.start_block, data.end_block
            )));
        }
        Ok(())
    }
}
