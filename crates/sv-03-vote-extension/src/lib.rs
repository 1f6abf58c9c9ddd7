//! # sv-03-vote-extension
//!
//! Encoding and validation of the two extension channels validators attach
//! to their precommits.
//!
//! ## Channels
//!
//! | Channel | Content | Signed over |
//! |---------|---------|-------------|
//! | Replay-protected | `VoteExtension` (side-tx votes, milestone proposition) | canonical bytes binding height, round and chain id |
//! | Non-RP | checkpoint sign bytes, or the dummy value | the raw bytes, so the signature is verifiable off-chain |
//!
//! ## Validation Points
//!
//! ```text
//! VerifyVoteExtension(h)  ── check_duplicate_votes, validate_non_rp_extension
//! ProcessProposal(h+1)    ── validate_vote_extensions over the embedded commit
//! ```

pub mod codec;
pub mod error;
pub mod non_rp;
pub mod signing;
pub mod validation;

pub use codec::{
    decode_commit_info, decode_vote_extension, encode_commit_info, encode_vote_extension,
};
pub use error::{NonRpError, VoteExtensionError, VoteExtensionResult};
pub use non_rp::{
    dummy_non_rp_extension, is_dummy_non_rp_extension, validate_non_rp_extension, NonRpVerifier,
    CHECKPOINT_NON_RP_PREFIX, DUMMY_NON_RP_MARKER,
};
pub use signing::{canonical_sign_bytes, sign_extension, vote_extension_sign_bytes};
pub use validation::{check_duplicate_votes, validate_vote_extensions, ExtendedCommitParams};
