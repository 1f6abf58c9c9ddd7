//! Port to the execution client.

use async_trait::async_trait;
use thiserror::Error;

/// What the next payload is built for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadAttributes {
    /// Sidechain height the payload will be proposed at.
    pub height: i64,
    /// Block time in unix seconds.
    pub timestamp: u64,
    /// Hash of the block the payload builds on.
    pub parent_hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPayload {
    pub height: i64,
    pub block_hash: Vec<u8>,
    /// Opaque encoded payload, proposed as-is.
    pub data: Vec<u8>,
}

/// Handle returned by the forkchoice handshake.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadId(pub [u8; 8]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("execution engine unavailable: {0}")]
    Unavailable(String),

    #[error("execution engine rejected request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Point the engine at the parent and start building on it.
    async fn forkchoice_updated(&self, attributes: &PayloadAttributes)
        -> Result<PayloadId, EngineError>;

    async fn get_payload(&self, id: &PayloadId) -> Result<ExecutionPayload, EngineError>;
}
