//! # Core Domain Entities
//!
//! The side-transaction voting model shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Primitives**: `Hash`, `Address`
//! - **Side-tx votes**: `Vote`, `SideTxResponse`, `ConsolidatedSideTxResponse`
//! - **Vote extensions**: `VoteExtension`, `MilestoneProposition`

use serde::{Deserialize, Serialize};

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// A 32-byte hash (SHA-256 or Keccak-256 depending on context).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address (validator signer / consensus address).
pub type Address = [u8; 20];

/// The zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Hex rendering for log fields (`0x`-prefixed).
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// =============================================================================
// CLUSTER B: SIDE-TX VOTES
// =============================================================================

/// Tri-state side-transaction vote.
///
/// The absence of a `SideTxResponse` for a transaction is distinct from an
/// explicit `Unspecified` vote.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Vote {
    #[default]
    Unspecified = 0,
    Yes = 1,
    No = 2,
}

impl Vote {
    /// Stable label for events and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vote::Unspecified => "unspecified",
            Vote::Yes => "yes",
            Vote::No => "no",
        }
    }
}

impl std::fmt::Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validator's vote on one transaction carrying a side message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideTxResponse {
    pub tx_hash: Vec<u8>,
    pub result: Vote,
}

impl SideTxResponse {
    pub fn new(tx_hash: impl Into<Vec<u8>>, result: Vote) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            result,
        }
    }
}

/// All side-tx votes of one validator for one block.
///
/// `height` and `block_hash` bind the votes to an exact block so they cannot
/// be replayed across heights or forks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsolidatedSideTxResponse {
    pub side_tx_responses: Vec<SideTxResponse>,
    pub height: i64,
    pub block_hash: Vec<u8>,
}

// =============================================================================
// CLUSTER C: VOTE EXTENSIONS
// =============================================================================

/// A validator's claim about the next contiguous run of child-chain blocks.
///
/// `block_hashes[0]` is the hash of block `start_block_number`, whose parent
/// is `parent_hash`. `block_tds[i]` is the total difficulty of
/// `block_hashes[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MilestoneProposition {
    pub block_hashes: Vec<Vec<u8>>,
    pub start_block_number: u64,
    pub parent_hash: Vec<u8>,
    pub block_tds: Vec<u64>,
}

impl MilestoneProposition {
    /// Last child-chain block number covered by this proposition.
    pub fn end_block_number(&self) -> Option<u64> {
        if self.block_hashes.is_empty() {
            return None;
        }
        Some(self.start_block_number + self.block_hashes.len() as u64 - 1)
    }
}

/// The replay-protected vote extension, produced once per validator per height.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteExtension {
    pub consolidated_side_tx_response: ConsolidatedSideTxResponse,
    pub milestone_proposition: Option<MilestoneProposition>,
}

impl VoteExtension {
    pub fn height(&self) -> i64 {
        self.consolidated_side_tx_response.height
    }

    pub fn side_tx_responses(&self) -> &[SideTxResponse] {
        &self.consolidated_side_tx_response.side_tx_responses
    }
}
