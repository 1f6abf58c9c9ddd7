//! Persisted checkpoint state.
//!
//! Thin typed accessors over the module's key prefixes. All reads of absent
//! keys return the zero value (or `None`) so a fresh store behaves like a
//! chain with no checkpoints.

use crate::domain::{Checkpoint, Params};
use crate::error::{CheckpointError, CheckpointResult};
use shared_types::{codec, Address, ProposerRotation, ValidatorSet};
use sv_01_state_store::{get_typed, put_typed, KvStore, StoreResult};

const CHECKPOINT_PREFIX: u8 = 0x01;
const BUFFER_KEY: &[u8] = &[0x02];
const ACK_COUNT_KEY: &[u8] = &[0x03];
const LAST_NO_ACK_KEY: &[u8] = &[0x04];
const PARAMS_KEY: &[u8] = &[0x05];
const ROTATION_KEY: &[u8] = &[0x06];
const CHAIN_START_KEY: &[u8] = &[0x07];

fn checkpoint_key(id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(CHECKPOINT_PREFIX);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

// =============================================================================
// PARAMS
// =============================================================================

pub fn params(store: &dyn KvStore) -> StoreResult<Params> {
    Ok(get_typed(store, PARAMS_KEY)?.unwrap_or_default())
}

pub fn set_params(store: &mut dyn KvStore, params: &Params) -> StoreResult<()> {
    put_typed(store, PARAMS_KEY, params)
}

// =============================================================================
// CHECKPOINTS
// =============================================================================

pub fn checkpoint_by_id(store: &dyn KvStore, id: u64) -> StoreResult<Option<Checkpoint>> {
    get_typed(store, &checkpoint_key(id))
}

/// Store a committed checkpoint under its id.
pub fn add_checkpoint(store: &mut dyn KvStore, checkpoint: &Checkpoint) -> StoreResult<()> {
    put_typed(store, &checkpoint_key(checkpoint.id), checkpoint)
}

/// Every committed checkpoint in id order.
pub fn checkpoints(store: &dyn KvStore) -> StoreResult<Vec<Checkpoint>> {
    store
        .prefix_scan(&[CHECKPOINT_PREFIX])?
        .into_iter()
        .map(|(_, bytes)| -> StoreResult<Checkpoint> { Ok(codec::decode(&bytes)?) })
        .collect()
}

pub fn last_checkpoint(store: &dyn KvStore) -> StoreResult<Option<Checkpoint>> {
    match ack_count(store)? {
        0 => Ok(None),
        n => checkpoint_by_id(store, n),
    }
}

/// First child block the next checkpoint must cover.
pub fn next_start_block(store: &dyn KvStore) -> CheckpointResult<u64> {
    match last_checkpoint(store)? {
        Some(cp) => block_after(cp.end_block),
        None => Ok(0),
    }
}

pub(crate) fn block_after(end_block: u64) -> CheckpointResult<u64> {
    end_block
        .checked_add(1)
        .ok_or(CheckpointError::ChildRangeExhausted { end_block })
}

// =============================================================================
// BUFFER
// =============================================================================

pub fn buffered_checkpoint(store: &dyn KvStore) -> StoreResult<Option<Checkpoint>> {
    get_typed(store, BUFFER_KEY)
}

pub fn set_buffer(store: &mut dyn KvStore, checkpoint: &Checkpoint) -> StoreResult<()> {
    put_typed(store, BUFFER_KEY, checkpoint)
}

pub fn clear_buffer(store: &mut dyn KvStore) -> StoreResult<()> {
    store.delete(BUFFER_KEY)
}

// =============================================================================
// COUNTERS AND TIMES
// =============================================================================

pub fn ack_count(store: &dyn KvStore) -> StoreResult<u64> {
    Ok(get_typed(store, ACK_COUNT_KEY)?.unwrap_or(0))
}

pub fn set_ack_count(store: &mut dyn KvStore, count: u64) -> StoreResult<()> {
    put_typed(store, ACK_COUNT_KEY, &count)
}

pub fn last_no_ack(store: &dyn KvStore) -> StoreResult<u64> {
    Ok(get_typed(store, LAST_NO_ACK_KEY)?.unwrap_or(0))
}

pub fn set_last_no_ack(store: &mut dyn KvStore, time: u64) -> StoreResult<()> {
    put_typed(store, LAST_NO_ACK_KEY, &time)
}

pub fn chain_start_time(store: &dyn KvStore) -> StoreResult<Option<u64>> {
    get_typed(store, CHAIN_START_KEY)
}

pub fn set_chain_start_time(store: &mut dyn KvStore, time: u64) -> StoreResult<()> {
    put_typed(store, CHAIN_START_KEY, &time)
}

/// Timestamp of the last committed checkpoint, falling back to the chain
/// start time, then to zero.
pub fn last_checkpoint_time(store: &dyn KvStore) -> StoreResult<u64> {
    if let Some(cp) = last_checkpoint(store)? {
        return Ok(cp.timestamp);
    }
    Ok(chain_start_time(store)?.unwrap_or(0))
}

// =============================================================================
// PROPOSER ROTATION
// =============================================================================

/// Stored rotation, or a fresh one seeded from `set`.
pub fn rotation(store: &dyn KvStore, set: &ValidatorSet) -> StoreResult<ProposerRotation> {
    Ok(get_typed(store, ROTATION_KEY)?.unwrap_or_else(|| ProposerRotation::new(set)))
}

pub fn set_rotation(store: &mut dyn KvStore, rotation: &ProposerRotation) -> StoreResult<()> {
    put_typed(store, ROTATION_KEY, rotation)
}

pub fn current_proposer(store: &dyn KvStore, set: &ValidatorSet) -> StoreResult<Option<Address>> {
    Ok(rotation(store, set)?.proposer())
}

/// Move the checkpoint proposer `steps` positions forward.
pub fn advance_proposer(
    store: &mut dyn KvStore,
    set: &ValidatorSet,
    steps: u64,
) -> StoreResult<Option<Address>> {
    let mut rotation = rotation(&*store, set)?;
    let proposer = rotation.advance(set, steps);
    set_rotation(store, &rotation)?;
    Ok(proposer)
}
