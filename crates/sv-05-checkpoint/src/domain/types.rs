//! Checkpoint entities, messages and parameters.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

pub const MSG_CHECKPOINT: &str = "/checkpoint.v1.MsgCheckpoint";
pub const MSG_CP_ACK: &str = "/checkpoint.v1.MsgCpAck";
pub const MSG_CP_NO_ACK: &str = "/checkpoint.v1.MsgCpNoAck";

/// A checkpoint, buffered or committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Sequential id; the id it will get on commit while buffered.
    pub id: u64,
    pub proposer: Address,
    pub start_block: u64,
    pub end_block: u64,
    pub root_hash: Hash,
    pub bor_chain_id: String,
    /// Unix seconds when buffered, then when committed.
    pub timestamp: u64,
}

impl Checkpoint {
    /// Number of child blocks covered.
    pub fn len(&self) -> u64 {
        self.end_block.saturating_sub(self.start_block) + 1
    }
}

/// Module parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Seconds a buffered checkpoint may wait for its ack.
    pub checkpoint_buffer_time: u64,
    /// Preferred number of child blocks per checkpoint.
    pub avg_checkpoint_length: u64,
    pub max_checkpoint_length: u64,
    pub child_chain_block_interval: u64,
    /// Chain id of the child chain checkpoints refer to.
    pub bor_chain_id: String,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            checkpoint_buffer_time: 1_000,
            avg_checkpoint_length: 256,
            max_checkpoint_length: 1_024,
            child_chain_block_interval: 10_000,
            bor_chain_id: "15001".to_string(),
        }
    }
}

/// Proposal of a new checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCheckpoint {
    pub proposer: Address,
    pub start_block: u64,
    pub end_block: u64,
    pub root_hash: Hash,
    pub bor_chain_id: String,
}

/// Acknowledgement that the buffered checkpoint landed on the root chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCpAck {
    pub from: Address,
    /// Checkpoint number assigned by the root chain contract.
    pub number: u64,
    pub proposer: Address,
    pub start_block: u64,
    pub end_block: u64,
    pub root_hash: Hash,
    /// Root-chain transaction that emitted the checkpoint event.
    pub tx_hash: Hash,
    pub log_index: u64,
}

/// Claim that the current proposer failed to get a checkpoint acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCpNoAck {
    pub from: Address,
}

/// Checkpoint event as emitted by the root chain contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCheckpointEvent {
    pub number: u64,
    pub proposer: Address,
    pub start_block: u64,
    pub end_block: u64,
    pub root_hash: Hash,
}

impl RootCheckpointEvent {
    /// Whether the event confirms exactly what `msg` claims.
    pub fn matches(&self, msg: &MsgCpAck) -> bool {
        self.number == msg.number
            && self.proposer == msg.proposer
            && self.start_block == msg.start_block
            && self.end_block == msg.end_block
            && self.root_hash == msg.root_hash
    }
}
