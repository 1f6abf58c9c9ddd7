//! # Sidechain Validator Test Suite
//!
//! Multi-validator tests that drive the lifecycle application through whole
//! heights.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs          # Network of validators sharing child/root chains
//! └── integration/
//!     ├── checkpoint_flow.rs     # propose → buffer → ack → commit, milestones
//!     ├── vote_threshold.rs      # exact ⌊2·total/3⌋+1 approval
//!     ├── extension_integrity.rs # tampered, duplicate and non-RP extensions
//!     ├── no_ack.rs              # proposer rotation on missing checkpoints
//!     └── runtime.rs             # node runtime with the payload producer
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sv-tests
//! cargo test -p sv-tests integration::no_ack
//! ```

#![allow(dead_code)]

pub mod harness;
pub mod integration;
