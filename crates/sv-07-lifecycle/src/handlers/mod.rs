//! Phase handlers.
//!
//! Each phase lives in its own file as an `impl Services` block.

mod extend;
mod finalize;
mod pre_block;
mod prepare;
mod process;
mod verify;

use shared_types::{Tx, VoteExtension};
use sv_01_state_store::Context;
use sv_02_side_tx::{HandlerError, SideTxRegistry};
use sv_03_vote_extension::VoteExtensionError;
use thiserror::Error;

/// Why a proposal or a peer's vote extension was refused.
#[derive(Debug, Error)]
pub(crate) enum Rejection {
    #[error("proposal carries no extended commit")]
    MissingCommit,

    #[error("undecodable data: {0}")]
    Decode(VoteExtensionError),

    #[error("commit round {decoded} differs from recorded round {recorded}")]
    RoundMismatch { decoded: i32, recorded: i32 },

    #[error("no validator set for height {0}")]
    NoValidatorSet(i64),

    #[error("{0}")]
    VoteExtension(VoteExtensionError),

    #[error("vote extension present before extensions are enabled")]
    UnexpectedExtension,

    #[error("invalid milestone proposition: {0}")]
    Milestone(String),

    #[error("invalid non-RP extension: {0}")]
    NonRp(String),

    #[error("tx {index} rejected: {source}")]
    Tx { index: usize, source: HandlerError },
}

impl Rejection {
    /// Metric label.
    pub(crate) fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingCommit | Rejection::Decode(_) => "decode",
            Rejection::RoundMismatch { .. } => "round",
            Rejection::NoValidatorSet(_) => "validator_set",
            Rejection::VoteExtension(_) | Rejection::UnexpectedExtension => "vote_extension",
            Rejection::Milestone(_) => "milestone",
            Rejection::NonRp(_) => "non_rp",
            Rejection::Tx { .. } => "tx",
        }
    }
}

/// Decode a tx and check it may enter a block.
pub(crate) fn admit_tx(registry: &SideTxRegistry, bytes: &[u8]) -> Result<Tx, HandlerError> {
    let tx = Tx::decode(bytes).map_err(HandlerError::tx_decode)?;
    registry
        .check_single_side_msg(&tx)
        .map_err(|e| HandlerError::from_registry(&e))?;
    Ok(tx)
}

/// Admit and route one tx on a cache of `ctx`, kept only on success.
///
/// Under a discarded outer cache this is the dry-run used by proposal
/// building and checking.
pub(crate) fn execute_tx(
    registry: &SideTxRegistry,
    ctx: &mut Context<'_>,
    bytes: &[u8],
) -> Result<Tx, HandlerError> {
    let tx = admit_tx(registry, bytes)?;
    ctx.set_tx_hash(shared_types::tx_hash(bytes).to_vec());
    ctx.with_cache(|c| registry.route_tx(c, &tx))?;
    Ok(tx)
}

/// Checks shared by ExtendVote output and VerifyVoteExtension input.
pub(crate) fn check_extension_binding(
    extension: &VoteExtension,
    height: i64,
    block_hash: &[u8],
) -> Result<(), Rejection> {
    if extension.height() != height {
        return Err(Rejection::VoteExtension(VoteExtensionError::HeightMismatch {
            expected: height,
            actual: extension.height(),
        }));
    }
    if extension.consolidated_side_tx_response.block_hash != block_hash {
        return Err(Rejection::VoteExtension(VoteExtensionError::BlockHashMismatch));
    }
    Ok(())
}
