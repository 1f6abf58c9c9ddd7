//! Fixed-width encoding of a checkpoint for root-chain signature checks.
//!
//! Five 32-byte big-endian words, the layout the root chain contract
//! decodes:
//!
//! ```text
//! proposer (left-padded) | start_block | end_block | root_hash | keccak256(bor_chain_id)
//! ```

use crate::domain::types::MsgCheckpoint;
use shared_crypto::keccak256;
use shared_types::{Address, Hash};

pub const CHECKPOINT_SIGN_BYTES_LEN: usize = 5 * 32;

/// Decoded sign bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSignData {
    pub proposer: Address,
    pub start_block: u64,
    pub end_block: u64,
    pub root_hash: Hash,
    pub chain_id_hash: Hash,
}

pub fn checkpoint_sign_bytes(msg: &MsgCheckpoint) -> Vec<u8> {
    let mut out = Vec::with_capacity(CHECKPOINT_SIGN_BYTES_LEN);
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(&msg.proposer);
    out.extend_from_slice(&u64_word(msg.start_block));
    out.extend_from_slice(&u64_word(msg.end_block));
    out.extend_from_slice(&msg.root_hash);
    out.extend_from_slice(&keccak256(msg.bor_chain_id.as_bytes()));
    out
}

/// Parse sign bytes; `None` on wrong length, dirty padding or a block number
/// that does not fit in 64 bits.
pub fn parse_checkpoint_sign_bytes(bytes: &[u8]) -> Option<CheckpointSignData> {
    if bytes.len() != CHECKPOINT_SIGN_BYTES_LEN {
        return None;
    }
    let words: Vec<&[u8]> = bytes.chunks_exact(32).collect();

    if words[0][..12].iter().any(|b| *b != 0) {
        return None;
    }
    let mut proposer = [0u8; 20];
    proposer.copy_from_slice(&words[0][12..]);

    let mut root_hash = [0u8; 32];
    root_hash.copy_from_slice(words[3]);
    let mut chain_id_hash = [0u8; 32];
    chain_id_hash.copy_from_slice(words[4]);

    Some(CheckpointSignData {
        proposer,
        start_block: word_u64(words[1])?,
        end_block: word_u64(words[2])?,
        root_hash,
        chain_id_hash,
    })
}

fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_u64(word: &[u8]) -> Option<u64> {
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[24..]);
    Some(u64::from_be_bytes(buf))
}
