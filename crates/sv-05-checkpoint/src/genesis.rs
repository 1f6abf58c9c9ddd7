//! Genesis state of the checkpoint module.

use crate::domain::{Checkpoint, Params};
use crate::error::{CheckpointError, CheckpointResult};
use crate::keeper;
use serde::{Deserialize, Serialize};
use shared_types::{ProposerRotation, ValidatorSet};
use sv_01_state_store::KvStore;
use tracing::info;

/// Checkpoint state at chain start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisState {
    pub params: Params,
    /// Already committed checkpoints, ids dense from 1.
    pub checkpoints: Vec<Checkpoint>,
    pub buffered_checkpoint: Option<Checkpoint>,
    pub last_no_ack: u64,
    /// Unix seconds; the last-checkpoint time before any checkpoint exists.
    pub chain_start_time: u64,
}

/// Load `state` into an empty store and seed the proposer rotation from
/// `validators`.
///
/// Checkpoints must be contiguous and numbered 1..=n.
pub fn init_genesis(
    store: &mut dyn KvStore,
    state: &GenesisState,
    validators: &ValidatorSet,
) -> CheckpointResult<()> {
    let mut expected_start = 0;
    for (i, cp) in state.checkpoints.iter().enumerate() {
        let expected_id = i as u64 + 1;
        if cp.id != expected_id {
            return Err(CheckpointError::InvalidAckNumber {
                expected: expected_id,
                actual: cp.id,
            });
        }
        if cp.start_block != expected_start {
            return Err(CheckpointError::DiscontinuousCheckpoint {
                expected: expected_start,
                actual: cp.start_block,
            });
        }
        expected_start = keeper::block_after(cp.end_block)?;
    }

    keeper::set_params(store, &state.params)?;
    for cp in &state.checkpoints {
        keeper::add_checkpoint(store, cp)?;
    }
    keeper::set_ack_count(store, state.checkpoints.len() as u64)?;
    if let Some(buffered) = &state.buffered_checkpoint {
        keeper::set_buffer(store, buffered)?;
    }
    keeper::set_last_no_ack(store, state.last_no_ack)?;
    keeper::set_chain_start_time(store, state.chain_start_time)?;
    keeper::set_rotation(store, &ProposerRotation::new(validators))?;

    info!(
        checkpoints = state.checkpoints.len(),
        validators = validators.len(),
        "[sv-05] checkpoint genesis loaded"
    );
    Ok(())
}

/// Snapshot the module state.
pub fn export_genesis(store: &dyn KvStore) -> CheckpointResult<GenesisState> {
    Ok(GenesisState {
        params: keeper::params(store)?,
        checkpoints: keeper::checkpoints(store)?,
        buffered_checkpoint: keeper::buffered_checkpoint(store)?,
        last_no_ack: keeper::last_no_ack(store)?,
        chain_start_time: keeper::chain_start_time(store)?.unwrap_or(0),
    })
}
