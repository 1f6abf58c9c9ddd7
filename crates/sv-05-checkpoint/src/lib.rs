//! # sv-05-checkpoint
//!
//! Checkpoint module: the worked consumer of the side-tx registry.
//!
//! ## Overview
//!
//! A checkpoint summarises a contiguous range of child-chain blocks by its
//! root hash. Validators agree on it through side-tx voting before it is
//! submitted to the root chain, then commit it once the root chain
//! acknowledges the submission.
//!
//! ## State Machine
//!
//! ```text
//!            MsgCheckpoint (Yes)              MsgCpAck (Yes)
//!   [EMPTY] ───────────────────→ [BUFFERED] ─────────────────→ [EMPTY] + checkpoint #n
//!      ↑                             │
//!      └──── buffer_time expired ────┘   (flushed by the next approved MsgCheckpoint)
//!
//!   MsgCpNoAck: rotates the proposer when no checkpoint lands in time
//! ```
//!
//! ## Invariants
//!
//! - Committed checkpoints are contiguous: `start(n) == end(n-1) + 1`, and
//!   the first one starts at child block 0.
//! - Checkpoint ids are dense from 1 and equal the ack count after commit.
//! - Side handlers never write state.
//!
//! ## Persisted Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `0x01 ‖ id_be` | `Checkpoint` |
//! | `0x02` | buffered `Checkpoint` |
//! | `0x03` | ack count |
//! | `0x04` | last no-ack time |
//! | `0x05` | `Params` |
//! | `0x06` | `ProposerRotation` |
//! | `0x07` | chain start time |

pub mod adapters;
pub mod domain;
pub mod error;
pub mod events;
pub mod genesis;
pub mod keeper;
pub mod module;
pub mod ports;

pub use domain::{
    checkpoint_sign_bytes, merkle_root, parse_checkpoint_sign_bytes, Checkpoint, MsgCheckpoint,
    MsgCpAck, MsgCpNoAck, Params, RootCheckpointEvent, MSG_CHECKPOINT, MSG_CP_ACK, MSG_CP_NO_ACK,
};
pub use error::{CheckpointError, CheckpointResult, CODESPACE};
pub use genesis::{export_genesis, init_genesis, GenesisState};
pub use module::CheckpointModule;
pub use ports::{ChildChainClient, ChildHeader, QueryError, RootChainClient, ValidatorSetProvider};
