//! Copy-on-write overlay over a parent store.

use crate::error::StoreResult;
use crate::store::KvStore;
use std::collections::BTreeMap;

/// A write buffer on top of a parent store.
///
/// Reads fall through to the parent for keys not written in the overlay.
/// Nothing reaches the parent until `commit()`; `discard()` (or dropping the
/// cache) throws the writes away.
pub struct CacheStore<'p> {
    parent: &'p mut dyn KvStore,
    /// `None` marks a deletion.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'p> CacheStore<'p> {
    pub fn new(parent: &'p mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of buffered writes (including deletions).
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Flush buffered writes into the parent.
    pub fn commit(self) -> StoreResult<()> {
        let Self { parent, writes } = self;
        for (key, value) in writes {
            match value {
                Some(value) => parent.put(&key, &value)?,
                None => parent.delete(&key)?,
            }
        }
        Ok(())
    }

    /// Drop buffered writes.
    pub fn discard(self) {
        if !self.writes.is_empty() {
            tracing::trace!(writes = self.writes.len(), "[sv-01] discarding cache writes");
        }
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.parent.get(key),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix)?.into_iter().collect();
        for (key, value) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}
