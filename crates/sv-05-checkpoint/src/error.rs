//! Error types for the checkpoint module.
//!
//! Every variant maps to a stable code in the `checkpoint` codespace so
//! users see a specific transaction failure per condition.

use shared_types::CodecError;
use sv_01_state_store::StoreError;
use sv_02_side_tx::HandlerError;
use thiserror::Error;

pub const CODESPACE: &str = "checkpoint";

/// Checkpoint module errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    #[error("message decode failed: {0}")]
    Decode(#[from] CodecError),

    #[error("checkpoint buffer occupied until {expires_at}")]
    BufferOccupied { expires_at: u64 },

    #[error("discontinuous checkpoint: expected start {expected}, got {actual}")]
    DiscontinuousCheckpoint { expected: u64, actual: u64 },

    #[error("no-ack too early: {elapsed}s since last checkpoint, buffer time {buffer_time}s")]
    InvalidNoAckTiming { elapsed: u64, buffer_time: u64 },

    #[error("invalid no-ack proposer")]
    InvalidNoAckProposer,

    #[error("too many no-acks: last one {elapsed}s ago")]
    TooManyNoAcks { elapsed: u64 },

    #[error("no checkpoint in buffer")]
    NoBufferedCheckpoint,

    #[error("invalid ack number: expected {expected}, got {actual}")]
    InvalidAckNumber { expected: u64, actual: u64 },

    #[error("sender is not the current checkpoint proposer")]
    InvalidProposer,

    #[error("invalid child chain id: expected {expected}, got {actual}")]
    InvalidChainId { expected: String, actual: String },

    #[error("invalid checkpoint length: start {start}, end {end}, max {max}")]
    InvalidLength { start: u64, end: u64, max: u64 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("validator set unavailable at height {height}")]
    ValidatorSetUnavailable { height: i64 },

    #[error("no child block follows checkpoint end {end_block}")]
    ChildRangeExhausted { end_block: u64 },
}

impl CheckpointError {
    /// Stable error code within [`CODESPACE`].
    pub fn code(&self) -> u32 {
        match self {
            CheckpointError::Decode(_) => 1,
            CheckpointError::BufferOccupied { .. } => 2,
            CheckpointError::DiscontinuousCheckpoint { .. } => 3,
            CheckpointError::InvalidNoAckTiming { .. } => 4,
            CheckpointError::InvalidNoAckProposer => 5,
            CheckpointError::TooManyNoAcks { .. } => 6,
            CheckpointError::NoBufferedCheckpoint => 7,
            CheckpointError::InvalidAckNumber { .. } => 8,
            CheckpointError::InvalidProposer => 9,
            CheckpointError::InvalidChainId { .. } => 10,
            CheckpointError::InvalidLength { .. } => 11,
            CheckpointError::Store(_) => 12,
            CheckpointError::ValidatorSetUnavailable { .. } => 13,
            CheckpointError::ChildRangeExhausted { .. } => 14,
        }
    }
}

impl From<CheckpointError> for HandlerError {
    fn from(err: CheckpointError) -> Self {
        HandlerError::new(CODESPACE, err.code(), err.to_string())
    }
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(CheckpointError::BufferOccupied { expires_at: 0 }.code(), 2);
        assert_eq!(
            CheckpointError::DiscontinuousCheckpoint {
                expected: 1,
                actual: 2
            }
            .code(),
            3
        );
        assert_eq!(
            CheckpointError::InvalidNoAckTiming {
                elapsed: 0,
                buffer_time: 1
            }
            .code(),
            4
        );
        assert_eq!(CheckpointError::InvalidNoAckProposer.code(), 5);
        assert_eq!(CheckpointError::TooManyNoAcks { elapsed: 0 }.code(), 6);
    }

    #[test]
    fn test_into_handler_error() {
        let err: HandlerError = CheckpointError::InvalidNoAckProposer.into();
        assert_eq!(err.codespace, "checkpoint");
        assert_eq!(err.code, 5);
    }
}
