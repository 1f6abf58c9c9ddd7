//! Persisted milestone and span state.

use crate::domain::{Milestone, Params, Span};
use shared_types::codec;
use sv_01_state_store::{get_typed, put_typed, KvStore, StoreResult};

const MILESTONE_PREFIX: u8 = 0x10;
const MILESTONE_COUNT_KEY: &[u8] = &[0x11];
const LAST_MILESTONE_HEIGHT_KEY: &[u8] = &[0x12];
const PARAMS_KEY: &[u8] = &[0x13];
const SPAN_PREFIX: u8 = 0x14;
const LATEST_SPAN_KEY: &[u8] = &[0x15];
const LAST_ROTATION_HEIGHT_KEY: &[u8] = &[0x16];

fn prefixed(prefix: u8, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(prefix);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

pub fn params(store: &dyn KvStore) -> StoreResult<Params> {
    Ok(get_typed(store, PARAMS_KEY)?.unwrap_or_default())
}

pub fn set_params(store: &mut dyn KvStore, params: &Params) -> StoreResult<()> {
    put_typed(store, PARAMS_KEY, params)
}

// =============================================================================
// MILESTONES
// =============================================================================

pub fn milestone_count(store: &dyn KvStore) -> StoreResult<u64> {
    Ok(get_typed(store, MILESTONE_COUNT_KEY)?.unwrap_or(0))
}

pub fn milestone_by_number(store: &dyn KvStore, number: u64) -> StoreResult<Option<Milestone>> {
    get_typed(store, &prefixed(MILESTONE_PREFIX, number))
}

pub fn last_milestone(store: &dyn KvStore) -> StoreResult<Option<Milestone>> {
    match milestone_count(store)? {
        0 => Ok(None),
        n => milestone_by_number(store, n),
    }
}

/// Append `milestone`; its number must be `milestone_count + 1`.
pub fn add_milestone(store: &mut dyn KvStore, milestone: &Milestone) -> StoreResult<()> {
    put_typed(store, &prefixed(MILESTONE_PREFIX, milestone.number), milestone)?;
    put_typed(store, MILESTONE_COUNT_KEY, &milestone.number)
}

pub fn last_milestone_height(store: &dyn KvStore) -> StoreResult<i64> {
    Ok(get_typed(store, LAST_MILESTONE_HEIGHT_KEY)?.unwrap_or(0))
}

pub fn set_last_milestone_height(store: &mut dyn KvStore, height: i64) -> StoreResult<()> {
    put_typed(store, LAST_MILESTONE_HEIGHT_KEY, &height)
}

// =============================================================================
// SPANS
// =============================================================================

pub fn span_by_id(store: &dyn KvStore, id: u64) -> StoreResult<Option<Span>> {
    get_typed(store, &prefixed(SPAN_PREFIX, id))
}

pub fn latest_span(store: &dyn KvStore) -> StoreResult<Option<Span>> {
    match get_typed::<u64>(store, LATEST_SPAN_KEY)? {
        Some(id) => span_by_id(store, id),
        None => Ok(None),
    }
}

pub fn add_span(store: &mut dyn KvStore, span: &Span) -> StoreResult<()> {
    put_typed(store, &prefixed(SPAN_PREFIX, span.id), span)?;
    put_typed(store, LATEST_SPAN_KEY, &span.id)
}

/// Newest span covering `block`.
pub fn span_for_block(store: &dyn KvStore, block: u64) -> StoreResult<Option<Span>> {
    let spans = store.prefix_scan(&[SPAN_PREFIX])?;
    for (_, bytes) in spans.iter().rev() {
        let span: Span = codec::decode(bytes)?;
        if span.contains(block) {
            return Ok(Some(span));
        }
    }
    Ok(None)
}

pub fn last_rotation_height(store: &dyn KvStore) -> StoreResult<i64> {
    Ok(get_typed(store, LAST_ROTATION_HEIGHT_KEY)?.unwrap_or(0))
}

pub fn set_last_rotation_height(store: &mut dyn KvStore, height: i64) -> StoreResult<()> {
    put_typed(store, LAST_ROTATION_HEIGHT_KEY, &height)
}
