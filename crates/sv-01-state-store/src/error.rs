//! Error types for the state store.

use shared_types::CodecError;
use thiserror::Error;

/// State store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Backend failure (I/O, corruption)
    #[error("Store backend error: {reason}")]
    Backend { reason: String },

    /// Stored value failed to encode or decode
    #[error("Stored value codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
