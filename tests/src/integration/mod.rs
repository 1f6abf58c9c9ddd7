//! Cross-subsystem flows through [`crate::harness::Network`].

mod checkpoint_flow;
mod extension_integrity;
mod no_ack;
mod runtime;
mod vote_threshold;
