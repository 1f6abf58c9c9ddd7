//! Root hash over a range of child-chain block hashes.

use shared_crypto::hashing::keccak256_many;
use shared_types::Hash;

/// Keccak binary Merkle root. An odd node is paired with itself; an empty
/// range has the zero root.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut level: Vec<Hash> = leaves.to_vec();
    while level.len() > 1 {
        let mut next_level = Vec::with_capacity((level.len() + 1) / 2);
        for chunk in level.chunks(2) {
            let left = &chunk[0];
            let right = chunk.get(1).unwrap_or(left);
            next_level.push(keccak256_many(&[left.as_slice(), right.as_slice()]));
        }
        level = next_level;
    }
    level[0]
}
