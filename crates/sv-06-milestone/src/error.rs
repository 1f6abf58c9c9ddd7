//! Error types for milestones and spans.

use shared_types::Address;
use sv_01_state_store::StoreError;
use sv_05_checkpoint::QueryError;
use thiserror::Error;

/// Milestone errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MilestoneError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("undecodable vote extension from {validator:?}: {reason}")]
    Decode { validator: Address, reason: String },

    #[error("invalid milestone proposition: {reason}")]
    InvalidProposition { reason: String },

    #[error("child chain query failed: {0}")]
    Query(#[from] QueryError),
}

impl MilestoneError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        MilestoneError::InvalidProposition {
            reason: reason.into(),
        }
    }
}

/// Result type for milestone operations
pub type MilestoneResult<T> = Result<T, MilestoneError>;
