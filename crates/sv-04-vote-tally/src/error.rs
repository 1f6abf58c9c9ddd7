//! Error types for the tallying engine.

use shared_types::{to_hex, Address};
use thiserror::Error;

/// Tally errors.
///
/// Both indicate data that passed ProcessProposal but should not have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    /// Validator voted twice on one transaction
    #[error("duplicate vote from {} on tx {}", to_hex(.validator), to_hex(.tx_hash))]
    DuplicateVote { validator: Address, tx_hash: Vec<u8> },

    /// Vote extension of a committing validator failed to decode
    #[error("undecodable vote extension from {}: {reason}", to_hex(.validator))]
    Decode { validator: Address, reason: String },
}

/// Result type for tally operations
pub type TallyResult<T> = Result<T, TallyError>;
