//! Store port and the in-memory adapter.

use crate::error::StoreResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::codec;
use std::collections::BTreeMap;

/// Abstract interface for key/value state.
///
/// Production: the replication engine's versioned store.
/// Testing: `MemStore` (below).
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Put a single key/value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> StoreResult<()>;

    /// All pairs whose key starts with `prefix`, in key order.
    fn prefix_scan(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Ordered in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.data.remove(key);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Read and decode a typed value.
pub fn get_typed<T: DeserializeOwned>(store: &dyn KvStore, key: &[u8]) -> StoreResult<Option<T>> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and write a typed value.
pub fn put_typed<T: Serialize>(store: &mut dyn KvStore, key: &[u8], value: &T) -> StoreResult<()> {
    let bytes = codec::encode(value)?;
    store.put(key, &bytes)
}
