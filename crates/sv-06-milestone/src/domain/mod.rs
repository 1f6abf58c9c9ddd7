//! Milestone domain types and pure agreement logic.

pub mod majority;
pub mod proposition;
pub mod types;

pub use majority::{majority_proposition, MajorityMilestone};
pub use proposition::{proposition_from_headers, validate_proposition};
pub use types::{Milestone, Params, Span};
