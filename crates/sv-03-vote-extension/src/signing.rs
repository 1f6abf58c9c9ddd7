//! Canonical signing context for vote extensions.
//!
//! Layout (little-endian, length-prefixed):
//!
//! ```text
//! u32 len(extension) | extension | i64 height | i64 round | u32 len(chain_id) | chain_id
//! ```
//!
//! Binding height, round and chain id makes a signed extension unusable at
//! any other height, round or chain.

use shared_crypto::Secp256k1KeyPair;

/// Canonical bytes for an arbitrary payload at `(height, round, chain_id)`.
pub fn canonical_sign_bytes(extension: &[u8], height: i64, round: i64, chain_id: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(extension.len() + chain_id.len() + 24);
    message.extend_from_slice(&(extension.len() as u32).to_le_bytes());
    message.extend_from_slice(extension);
    message.extend_from_slice(&height.to_le_bytes());
    message.extend_from_slice(&round.to_le_bytes());
    message.extend_from_slice(&(chain_id.len() as u32).to_le_bytes());
    message.extend_from_slice(chain_id.as_bytes());
    message
}

/// Bytes a validator signs for its replay-protected extension.
pub fn vote_extension_sign_bytes(extension: &[u8], height: i64, round: i32, chain_id: &str) -> Vec<u8> {
    canonical_sign_bytes(extension, height, i64::from(round), chain_id)
}

/// Sign both channels the way the replication engine does.
///
/// Returns `(extension_signature, non_rp_extension_signature)`.
pub fn sign_extension(
    keypair: &Secp256k1KeyPair,
    extension: &[u8],
    non_rp_extension: &[u8],
    height: i64,
    round: i32,
    chain_id: &str,
) -> (Vec<u8>, Vec<u8>) {
    let rp = keypair.sign(&vote_extension_sign_bytes(extension, height, round, chain_id));
    let non_rp = keypair.sign(non_rp_extension);
    (rp.as_bytes().to_vec(), non_rp.as_bytes().to_vec())
}
