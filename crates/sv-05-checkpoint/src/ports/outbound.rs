//! # Outbound Ports (Driven Ports)
//!
//! External data the module needs. Production adapters are RPC clients to
//! the child chain and the root chain; `adapters::memory` holds in-memory
//! implementations.
//!
//! All calls are synchronous: side handlers run inside the replication
//! engine's ABCI call and must return a vote before it proceeds.

use crate::domain::RootCheckpointEvent;
use shared_types::{Address, Hash, ValidatorSet};
use thiserror::Error;

/// External query failure.
///
/// `Unavailable` is transient (node down, timeout); `Invalid` means the
/// external chain answered and the answer contradicts the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("external chain unavailable: {0}")]
    Unavailable(String),

    #[error("invalid external data: {0}")]
    Invalid(String),
}

/// Child-chain block header as far as checkpoints and milestones care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildHeader {
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub total_difficulty: u64,
}

/// Child-chain (block-producing chain) queries.
pub trait ChildChainClient: Send + Sync {
    /// Root hash over blocks `start..=end`.
    fn get_root_hash(&self, start: u64, end: u64) -> Result<Hash, QueryError>;

    /// Whether block `end` exists with enough confirmations.
    fn check_blocks_exist(&self, end: u64) -> Result<bool, QueryError>;

    /// Producer (signer) of block `number`.
    fn get_block_author(&self, number: u64) -> Result<Address, QueryError>;

    /// Up to `count` consecutive headers starting at `start`. Fewer are
    /// returned when the chain tip is reached.
    fn get_headers(&self, start: u64, count: u64) -> Result<Vec<ChildHeader>, QueryError>;
}

/// Root-chain (settlement chain) queries.
pub trait RootChainClient: Send + Sync {
    /// Decode the checkpoint event at `log_index` of transaction `tx_hash`.
    fn get_checkpoint_event(
        &self,
        tx_hash: &Hash,
        log_index: u64,
    ) -> Result<RootCheckpointEvent, QueryError>;
}

/// Read access to the staking module's validator set.
pub trait ValidatorSetProvider: Send + Sync {
    /// Validator set in effect at `height`.
    fn validator_set(&self, height: i64) -> Option<ValidatorSet>;
}
