//! # sv-02-side-tx
//!
//! Registry mapping message type URLs to side handlers, post handlers and
//! deterministic message handlers.
//!
//! ## Overview
//!
//! - **Side handler**: evaluated by each validator during ExtendVote against
//!   external data; returns a `Vote`. Never mutates committed state.
//! - **Post handler**: invoked at PreBlock of the next height for every tx
//!   whose side message reached the approval threshold.
//! - **Msg handler**: deterministic execution, used for dry-run during
//!   proposal building and for delivery at FinalizeBlock.
//!
//! ## Invariant
//!
//! A transaction carries at most one message with a registered side handler.
//! Every stage that admits a transaction checks it through
//! [`SideTxRegistry::check_single_side_msg`].
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut registry = SideTxRegistry::new();
//! registry.register_side_handler(MSG_CHECKPOINT, module.clone())?;
//! registry.register_post_handler(MSG_CHECKPOINT, module.clone())?;
//! let registry = Arc::new(registry);
//! ```

pub mod error;
pub mod handler;
pub mod registry;

pub use error::{HandlerError, HandlerKind, RegistryError, RegistryResult};
pub use handler::{MsgHandler, PostMsgHandler, SideMsgHandler};
pub use registry::SideTxRegistry;
