//! Error types for the lifecycle controller.

use sv_01_state_store::StoreError;
use sv_03_vote_extension::VoteExtensionError;
use thiserror::Error;

/// Lifecycle errors.
///
/// Only `Fatal` requires the node to stop; the rest fail the current call.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    #[error("vote extension error: {0}")]
    VoteExtension(#[from] VoteExtensionError),

    /// Nothing fit into the proposal
    #[error("proposal for height {height} is empty")]
    EmptyProposal { height: i64 },

    /// Finalized data that cannot be processed. The node must halt.
    #[error("fatal error at height {height}: {reason}")]
    Fatal { height: i64, reason: String },
}

impl LifecycleError {
    pub fn fatal(height: i64, reason: impl std::fmt::Display) -> Self {
        Self::Fatal {
            height,
            reason: reason.to_string(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
