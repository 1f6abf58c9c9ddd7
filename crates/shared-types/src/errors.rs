//! # Error Types
//!
//! Errors shared across subsystems.

use thiserror::Error;

/// Wire encoding/decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Value could not be serialized.
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Bytes did not decode into the expected type.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Input was empty where a value was required.
    #[error("Empty input")]
    Empty,
}

/// Node operational states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Normal operation.
    Running,
    /// Halted after a post-supermajority failure (awaiting intervention).
    HaltedAwaitingIntervention,
}
