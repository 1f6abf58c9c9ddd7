//! The non-replay-protected extension channel.
//!
//! A validator with nothing to attest still fills the channel with the dummy
//! value for `(height, chain_id)`. Anything else must start with a known kind
//! prefix and is handed to the owning module's verifier.

use crate::error::NonRpError;
use crate::signing::canonical_sign_bytes;
use sv_01_state_store::Context;
use tracing::warn;

/// Extension payload of the dummy non-RP value.
pub const DUMMY_NON_RP_MARKER: &[u8] = b"dummy-non-rp-vote-extension";

/// Kind prefix of a checkpoint non-RP payload.
pub const CHECKPOINT_NON_RP_PREFIX: u8 = 0x01;

/// Deterministic placeholder for the non-RP channel.
///
/// Byte-identical for equal arguments on every validator; differs whenever
/// height or chain id differ.
pub fn dummy_non_rp_extension(height: i64, chain_id: &str) -> Vec<u8> {
    canonical_sign_bytes(DUMMY_NON_RP_MARKER, height, 0, chain_id)
}

pub fn is_dummy_non_rp_extension(bytes: &[u8], height: i64, chain_id: &str) -> bool {
    bytes == dummy_non_rp_extension(height, chain_id).as_slice()
}

/// Integrity check of a real non-RP payload (prefix stripped).
pub trait NonRpVerifier: Send + Sync {
    fn verify(&self, ctx: &Context<'_>, payload: &[u8]) -> Result<(), NonRpError>;
}

/// Validate a non-RP extension produced at `height`.
///
/// The dummy passes without consulting the verifier. Empty input, an unknown
/// prefix or a dummy for another height/chain is `Invalid`.
pub fn validate_non_rp_extension(
    ctx: &Context<'_>,
    bytes: &[u8],
    height: i64,
    chain_id: &str,
    verifier: &dyn NonRpVerifier,
) -> Result<(), NonRpError> {
    if is_dummy_non_rp_extension(bytes, height, chain_id) {
        return Ok(());
    }

    match bytes.split_first() {
        Some((&CHECKPOINT_NON_RP_PREFIX, payload)) if !payload.is_empty() => {
            verifier.verify(ctx, payload)
        }
        Some((prefix, _)) => {
            warn!(height, prefix = *prefix, "[sv-03] unrecognised non-RP extension");
            Err(NonRpError::Invalid(format!("unknown non-RP prefix {prefix:#04x}")))
        }
        None => Err(NonRpError::Invalid("empty non-RP extension".to_string())),
    }
}
