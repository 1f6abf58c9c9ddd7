//! Execution payload production.
//!
//! ```text
//! SideTxApp::commit(h) ──next_block──→ PayloadProducer ──forkchoice_updated──→ engine
//!                                            │          ←──get_payload────────
//! PrepareProposal(h+1) ←──latest──────────────┘
//! ```

mod engine;
mod producer;

pub use engine::{EngineError, ExecutionEngine, ExecutionPayload, PayloadAttributes, PayloadId};
pub use producer::{next_backoff, PayloadHandle, PayloadProducer, PayloadProducerConfig, MAX_BACKOFF};
