//! # sv-06-milestone
//!
//! Fast finality for the child chain. Every validator may attach a
//! `MilestoneProposition` (the next run of child-chain blocks it sees) to its
//! vote extension; at PreBlock the longest run backed by a supermajority of
//! voting power becomes a milestone.
//!
//! ## Flow
//!
//! ```text
//! ExtendVote(h)  ── MilestoneService::propose        (best effort)
//! VerifyVE(h)    ── validate_proposition             (shape only)
//! PreBlock(h+1)  ── MilestoneService::apply_majority ── store milestone
//!                                                    └─ maybe rotate span
//! ```
//!
//! ## Span Rotation
//!
//! - **Span end**: a milestone landing within `span_buffer` blocks of the
//!   current span's end appends the next span.
//! - **Stall**: no milestone (and no rotation) for more than
//!   `producer_stall_threshold` heights replaces the producer from the block
//!   after the last milestone.
//!
//! ## Persisted Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `0x10 ‖ number_be` | `Milestone` |
//! | `0x11` | milestone count |
//! | `0x12` | height of the last milestone |
//! | `0x13` | `Params` |
//! | `0x14 ‖ id_be` | `Span` |
//! | `0x15` | latest span id |
//! | `0x16` | height of the last stall rotation |

pub mod domain;
pub mod error;
pub mod events;
pub mod genesis;
pub mod keeper;
pub mod service;
pub mod span;

pub use domain::{
    majority_proposition, proposition_from_headers, validate_proposition, MajorityMilestone,
    Milestone, Params, Span,
};
pub use error::{MilestoneError, MilestoneResult};
pub use genesis::{init_genesis, GenesisState};
pub use service::{MilestoneOutcome, MilestoneService};
