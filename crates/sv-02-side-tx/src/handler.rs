//! Handler traits implemented by side-tx modules.

use crate::error::HandlerError;
use shared_types::{Address, Msg, Vote};
use sv_01_state_store::Context;

/// Evaluates a side message against external data.
///
/// Called during ExtendVote under a cache-wrapped context that is always
/// discarded. Implementations must not panic on any input: malformed
/// messages and unreachable external chains both yield `Vote::No`.
pub trait SideMsgHandler: Send + Sync {
    fn side_handler(&self, ctx: &mut Context<'_>, msg: &Msg) -> Vote;

    /// Bytes to carry in the non-replay-protected extension when this
    /// validator voted `Yes` on `msg`. `None` means the message has nothing
    /// to attest there.
    fn non_rp_sign_bytes(&self, _ctx: &mut Context<'_>, _msg: &Msg) -> Option<Vec<u8>> {
        None
    }
}

/// Applies an approved (or explicitly voted) side message at PreBlock.
///
/// Invoked under a cache that is committed only when this returns `Ok`.
pub trait PostMsgHandler: Send + Sync {
    fn post_handler(&self, ctx: &mut Context<'_>, msg: &Msg, vote: Vote)
        -> Result<(), HandlerError>;
}

/// Deterministic message execution.
pub trait MsgHandler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Msg, signer: &Address)
        -> Result<(), HandlerError>;
}
