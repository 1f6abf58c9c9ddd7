//! Events emitted by the checkpoint module.

use crate::domain::Checkpoint;
use shared_types::{to_hex, Address, Event, Vote};

pub const EVENT_CHECKPOINT: &str = "checkpoint";
pub const EVENT_CHECKPOINT_ACK: &str = "checkpoint-ack";
pub const EVENT_CHECKPOINT_NO_ACK: &str = "checkpoint-noack";

pub const ATTR_TX_HASH: &str = "tx-hash";
pub const ATTR_SIDE_TX_RESULT: &str = "side-tx-result";
pub const ATTR_PROPOSER: &str = "proposer";
pub const ATTR_START_BLOCK: &str = "start-block";
pub const ATTR_END_BLOCK: &str = "end-block";
pub const ATTR_ROOT_HASH: &str = "root-hash";
pub const ATTR_CHECKPOINT_NUMBER: &str = "checkpoint-number";
pub const ATTR_NEW_PROPOSER: &str = "new-proposer";

fn with_checkpoint(event: Event, checkpoint: &Checkpoint) -> Event {
    event
        .attr(ATTR_CHECKPOINT_NUMBER, checkpoint.id)
        .attr(ATTR_PROPOSER, to_hex(&checkpoint.proposer))
        .attr(ATTR_START_BLOCK, checkpoint.start_block)
        .attr(ATTR_END_BLOCK, checkpoint.end_block)
        .attr(ATTR_ROOT_HASH, to_hex(&checkpoint.root_hash))
}

/// A checkpoint proposal was post-handled.
pub fn checkpoint_event(tx_hash: &[u8], vote: Vote, checkpoint: &Checkpoint) -> Event {
    let event = Event::new(EVENT_CHECKPOINT)
        .attr(ATTR_TX_HASH, to_hex(tx_hash))
        .attr(ATTR_SIDE_TX_RESULT, vote);
    with_checkpoint(event, checkpoint)
}

/// A checkpoint acknowledgement was post-handled.
pub fn checkpoint_ack_event(tx_hash: &[u8], vote: Vote, checkpoint: &Checkpoint) -> Event {
    let event = Event::new(EVENT_CHECKPOINT_ACK)
        .attr(ATTR_TX_HASH, to_hex(tx_hash))
        .attr(ATTR_SIDE_TX_RESULT, vote);
    with_checkpoint(event, checkpoint)
}

/// A no-ack was accepted; `new_proposer` is the rotated checkpoint proposer.
pub fn checkpoint_no_ack_event(tx_hash: &[u8], from: &Address, new_proposer: &Address) -> Event {
    Event::new(EVENT_CHECKPOINT_NO_ACK)
        .attr(ATTR_TX_HASH, to_hex(tx_hash))
        .attr(ATTR_SIDE_TX_RESULT, Vote::Yes)
        .attr(ATTR_PROPOSER, to_hex(from))
        .attr(ATTR_NEW_PROPOSER, to_hex(new_proposer))
}
