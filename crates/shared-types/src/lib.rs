//! # Shared Types Crate
//!
//! Domain entities and replication-engine interface types shared by every
//! sidechain-validator subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: votes, vote extensions, transactions and the
//!   ABCI request/response shapes are defined here and nowhere else.
//! - **Deterministic Encoding**: everything that is hashed or signed goes
//!   through [`codec::encode`], so honest validators agree byte-for-byte.

pub mod abci;
pub mod codec;
pub mod entities;
pub mod errors;
pub mod tx;
pub mod validator;

pub use abci::*;
pub use entities::*;
pub use errors::*;
pub use tx::{tx_hash, Msg, Tx};
pub use validator::{supermajority_threshold, ProposerRotation, Validator, ValidatorSet};
