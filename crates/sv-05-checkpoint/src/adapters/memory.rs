//! In-memory adapters.
//!
//! Used by tests and by the node runtime in development mode. Each adapter
//! can be switched to `Unavailable` to simulate an unreachable chain.

use crate::domain::{merkle_root, RootCheckpointEvent};
use crate::ports::{ChildChainClient, ChildHeader, QueryError, RootChainClient, ValidatorSetProvider};
use parking_lot::RwLock;
use shared_types::{Address, Hash, ValidatorSet};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

/// Child chain backed by a map of headers.
#[derive(Default)]
pub struct InMemoryChildChain {
    headers: RwLock<BTreeMap<u64, (ChildHeader, Address)>>,
    unavailable: AtomicBool,
}

impl InMemoryChildChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `count` blocks authored by `author` after the current tip.
    /// Hashes are derived from the block number and `salt`.
    pub fn extend(&self, count: u64, author: Address, salt: u8) {
        let mut headers = self.headers.write();
        for _ in 0..count {
            let (number, parent_hash, td) = match headers.iter().next_back() {
                Some((n, (h, _))) => (n + 1, h.hash, h.total_difficulty),
                None => (0, [0u8; 32], 0),
            };
            let mut hash = [salt; 32];
            hash[..8].copy_from_slice(&number.to_be_bytes());
            headers.insert(
                number,
                (
                    ChildHeader {
                        number,
                        hash,
                        parent_hash,
                        total_difficulty: td + 1,
                    },
                    author,
                ),
            );
        }
    }

    pub fn tip(&self) -> Option<u64> {
        self.headers.read().keys().next_back().copied()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), QueryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueryError::Unavailable("child chain offline".to_string()));
        }
        Ok(())
    }
}

impl ChildChainClient for InMemoryChildChain {
    fn get_root_hash(&self, start: u64, end: u64) -> Result<Hash, QueryError> {
        self.check_available()?;
        if end < start {
            return Err(QueryError::Invalid(format!("empty range {start}..={end}")));
        }
        let headers = self.headers.read();
        let mut leaves = Vec::new();
        for number in start..=end {
            let (header, _) = headers
                .get(&number)
                .ok_or_else(|| QueryError::Unavailable(format!("block {number} not synced")))?;
            leaves.push(header.hash);
        }
        Ok(merkle_root(&leaves))
    }

    fn check_blocks_exist(&self, end: u64) -> Result<bool, QueryError> {
        self.check_available()?;
        Ok(self.headers.read().contains_key(&end))
    }

    fn get_block_author(&self, number: u64) -> Result<Address, QueryError> {
        self.check_available()?;
        self.headers
            .read()
            .get(&number)
            .map(|(_, author)| *author)
            .ok_or_else(|| QueryError::Unavailable(format!("block {number} not synced")))
    }

    fn get_headers(&self, start: u64, count: u64) -> Result<Vec<ChildHeader>, QueryError> {
        self.check_available()?;
        Ok(self
            .headers
            .read()
            .range(start..start.saturating_add(count))
            .map(|(_, (h, _))| h.clone())
            .collect())
    }
}

/// Root chain holding checkpoint events by `(tx_hash, log_index)`.
#[derive(Default)]
pub struct InMemoryRootChain {
    events: RwLock<HashMap<(Hash, u64), RootCheckpointEvent>>,
    unavailable: AtomicBool,
}

impl InMemoryRootChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_event(&self, tx_hash: Hash, log_index: u64, event: RootCheckpointEvent) {
        self.events.write().insert((tx_hash, log_index), event);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl RootChainClient for InMemoryRootChain {
    fn get_checkpoint_event(
        &self,
        tx_hash: &Hash,
        log_index: u64,
    ) -> Result<RootCheckpointEvent, QueryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueryError::Unavailable("root chain offline".to_string()));
        }
        self.events
            .read()
            .get(&(*tx_hash, log_index))
            .cloned()
            .ok_or_else(|| QueryError::Invalid("checkpoint event not found".to_string()))
    }
}

/// Validator set that only changes when told to.
pub struct StaticValidatorSet {
    set: RwLock<ValidatorSet>,
}

impl StaticValidatorSet {
    pub fn new(set: ValidatorSet) -> Self {
        Self {
            set: RwLock::new(set),
        }
    }

    pub fn replace(&self, set: ValidatorSet) {
        *self.set.write() = set;
    }
}

impl ValidatorSetProvider for StaticValidatorSet {
    fn validator_set(&self, _height: i64) -> Option<ValidatorSet> {
        Some(self.set.read().clone())
    }
}
