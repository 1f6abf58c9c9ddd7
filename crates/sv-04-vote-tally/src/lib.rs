//! # sv-04-vote-tally
//!
//! Aggregates per-validator side-tx votes of one extended commit into
//! approved / rejected / skipped transaction sets.
//!
//! ## Rules
//!
//! - Only votes flagged `Commit` carry extensions; others are ignored.
//! - A validator contributes at most once per `tx_hash`. A second entry is
//!   not counted and surfaces as [`TallyError::DuplicateVote`].
//! - With `threshold = ⌊2·total/3⌋ + 1`: `Yes ≥ threshold` approves,
//!   `No ≥ threshold` rejects, anything else (including no votes) skips.
//! - Output lists are sorted by `tx_hash`.

pub mod error;
pub mod tally;

pub use error::{TallyError, TallyResult};
pub use tally::{tally_votes, TallyOutcome, VoteTally};
