//! Error types for vote-extension handling.

use shared_types::{to_hex, Address, CodecError};
use thiserror::Error;

/// Vote-extension errors.
///
/// Every variant is a local rejection of peer input; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteExtensionError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("validator {} not in the set at this height", to_hex(.validator))]
    UnknownValidator { validator: Address },

    #[error("validator {} appears more than once in the commit", to_hex(.validator))]
    DuplicateValidator { validator: Address },

    #[error("validator {} power mismatch: set has {expected}, commit has {actual}", to_hex(.validator))]
    PowerMismatch {
        validator: Address,
        expected: i64,
        actual: i64,
    },

    #[error("invalid {channel} extension signature from {}", to_hex(.validator))]
    InvalidSignature {
        validator: Address,
        channel: &'static str,
    },

    #[error("empty vote extension from committing validator {}", to_hex(.validator))]
    EmptyExtension { validator: Address },

    #[error("non-commit vote from {} carries extension data", to_hex(.validator))]
    UnexpectedExtension { validator: Address },

    #[error("vote extension height mismatch: expected {expected}, got {actual}")]
    HeightMismatch { expected: i64, actual: i64 },

    #[error("vote extension block hash mismatch")]
    BlockHashMismatch,

    #[error("insufficient signed power: {signed} of {total}, need {required}")]
    InsufficientPower {
        signed: i64,
        total: i64,
        required: i64,
    },

    #[error("duplicate side-tx vote for {}", to_hex(.tx_hash))]
    DuplicateVote { tx_hash: Vec<u8> },
}

/// Result type for vote-extension operations
pub type VoteExtensionResult<T> = Result<T, VoteExtensionError>;

/// Non-RP verification outcome other than success.
///
/// Callers treat `Unavailable` as tolerable (external data could not be
/// fetched) and `Invalid` as an integrity failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NonRpError {
    #[error("non-RP data unavailable: {0}")]
    Unavailable(String),

    #[error("invalid non-RP extension: {0}")]
    Invalid(String),
}
