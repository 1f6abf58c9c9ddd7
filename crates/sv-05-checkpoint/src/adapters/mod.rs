//! Adapters for the outbound ports.

pub mod memory;

pub use memory::{InMemoryChildChain, InMemoryRootChain, StaticValidatorSet};
