//! # Service Container
//!
//! Builds every collaborator of the lifecycle application from a
//! [`NodeConfig`] and loads genesis state.
//!
//! ## Wiring
//!
//! ```text
//! InMemoryChildChain ─┬─→ CheckpointModule ──register──→ SideTxRegistry ─┐
//! InMemoryRootChain  ─┤         │ (NonRpVerifier)                         │
//! StaticValidatorSet ─┘         └──────────────────────────────────────→ SideTxApp
//! InMemoryChildChain ───→ MilestoneService ─────────────────────────────→ │
//! LocalExecutionEngine ─→ PayloadProducer ──PayloadHandle───────────────→ ┘
//! ```

pub mod config;
pub mod services;

pub use config::{ConfigError, NodeConfig};
pub use services::{NodeError, ServiceContainer};
