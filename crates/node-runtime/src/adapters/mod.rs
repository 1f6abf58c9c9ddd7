//! Outbound adapters owned by the runtime.

pub mod engine;

pub use engine::LocalExecutionEngine;
