//! Ports of the checkpoint module.

pub mod outbound;

pub use outbound::{ChildChainClient, ChildHeader, QueryError, RootChainClient, ValidatorSetProvider};
