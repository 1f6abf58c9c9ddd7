//! # Hashing
//!
//! - SHA-256: transaction hashes and the consensus engine's tx keys
//! - Keccak-256: signer addresses and root-chain compatible digests

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// 256-bit hash output.
pub type Hash = [u8; 32];

/// SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 (one-shot), as used by the root chain.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 over several inputs, concatenated.
pub fn keccak256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}
