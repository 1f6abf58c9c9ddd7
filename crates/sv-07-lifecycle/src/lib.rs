//! # sv-07-lifecycle
//!
//! Proposal lifecycle controller: the application side of the replication
//! engine's ABCI++ extension points.
//!
//! ## Phases
//!
//! ```text
//! height h                                        height h+1
//! ────────────────────────────────────────────    ─────────────────────────────
//! PrepareProposal   tx0 = extended commit(h-1)    PreBlock   decode tx0 = commit(h)
//! ProcessProposal   validate tx0, dry-run txs                milestone majority
//! ExtendVote        side handlers → VoteExtension            tally → post handlers
//! VerifyVoteExt     peer extension checks         FinalizeBlock  deliver txs
//! ```
//!
//! ## Failure Semantics
//!
//! Malformed peer input at ProcessProposal, ExtendVote and
//! VerifyVoteExtension is a local rejection. Anything that fails to decode
//! at PreBlock already carried a supermajority, so it surfaces as
//! [`LifecycleError::Fatal`] and the caller must halt.
//!
//! ## Execution Payload
//!
//! [`PayloadProducer`] runs on its own tokio task. Handlers only touch the
//! [`PayloadHandle`] side of its watch channels and never await.

pub mod app;
pub mod config;
pub mod error;
mod handlers;
pub mod payload;

pub use app::{SideTxApp, LAST_BLOCK_TXS_KEY, LAST_COMMITTED_HEIGHT_KEY};
pub use config::LifecycleConfig;
pub use error::{LifecycleError, LifecycleResult};
pub use payload::{
    next_backoff, EngineError, ExecutionEngine, ExecutionPayload, PayloadAttributes,
    PayloadHandle, PayloadId, PayloadProducer, PayloadProducerConfig, MAX_BACKOFF,
};
