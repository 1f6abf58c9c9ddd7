//! Wire encoding of vote extensions and of the commit carried as tx 0.

use crate::error::VoteExtensionResult;
use shared_types::{codec, ExtendedCommitInfo, VoteExtension};

pub fn encode_vote_extension(extension: &VoteExtension) -> VoteExtensionResult<Vec<u8>> {
    Ok(codec::encode(extension)?)
}

/// Decode a vote extension. Empty input is an error.
pub fn decode_vote_extension(bytes: &[u8]) -> VoteExtensionResult<VoteExtension> {
    Ok(codec::decode(bytes)?)
}

pub fn encode_commit_info(commit: &ExtendedCommitInfo) -> VoteExtensionResult<Vec<u8>> {
    Ok(codec::encode(commit)?)
}

pub fn decode_commit_info(bytes: &[u8]) -> VoteExtensionResult<ExtendedCommitInfo> {
    Ok(codec::decode(bytes)?)
}
