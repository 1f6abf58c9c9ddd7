//! # sv-01-state-store
//!
//! Key/value state access for the deterministic state machine.
//!
//! ## Overview
//!
//! - **`KvStore`**: the store port every module reads and writes through
//! - **`MemStore`**: ordered in-memory implementation
//! - **`CacheStore`**: copy-on-write overlay with explicit `commit()` / `discard()`
//! - **`Context`**: block header + store view + emitted events
//!
//! ## Cache Discipline
//!
//! ```text
//! Context ──with_discarded_cache──→ side handlers, dry-run   (writes dropped)
//!    │
//!    └─────with_cache──────────────→ post handlers, delivery  (writes kept on Ok)
//! ```
//!
//! Side handlers must never mutate committed state, so they only ever see a
//! cache that is thrown away.

pub mod cache;
pub mod context;
pub mod error;
pub mod store;

pub use cache::CacheStore;
pub use context::{BlockHeader, Context};
pub use error::{StoreError, StoreResult};
pub use store::{get_typed, put_typed, KvStore, MemStore};
