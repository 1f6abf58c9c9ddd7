//! Milestones, spans and module parameters.

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// A child-chain range finalized by supermajority agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Dense from 1.
    pub number: u64,
    pub milestone_id: String,
    pub proposer: Address,
    pub start_block: u64,
    pub end_block: u64,
    /// Hash of `end_block`.
    pub hash: Vec<u8>,
    /// Total difficulty at `end_block`.
    pub total_difficulty: u64,
    pub bor_chain_id: String,
    pub timestamp: u64,
}

/// Block-production assignment for a child-chain block range.
///
/// Spans are looked up newest first, so a later span overrides an earlier
/// one on the blocks they share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub id: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub producer: Address,
}

impl Span {
    pub fn contains(&self, block: u64) -> bool {
        self.start_block <= block && block <= self.end_block
    }
}

/// Module parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub max_milestone_proposition_length: u64,
    /// Child blocks behind the tip after which propositions fast-forward.
    pub ff_milestone_threshold: u64,
    /// Alignment of fast-forward start blocks.
    pub ff_milestone_block_interval: u64,
    pub span_length: u64,
    /// Distance to the span end at which the next span is appended.
    pub span_buffer: u64,
    /// Heights without a milestone before the producer is replaced.
    pub producer_stall_threshold: u64,
    pub bor_chain_id: String,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_milestone_proposition_length: 10,
            ff_milestone_threshold: 1_000,
            ff_milestone_block_interval: 100,
            span_length: 6_400,
            span_buffer: 128,
            producer_stall_threshold: 50,
            bor_chain_id: "15001".to_string(),
        }
    }
}
