//! Block-scoped execution context.

use crate::cache::CacheStore;
use crate::error::StoreError;
use crate::store::KvStore;
use shared_types::{Address, Event};

/// Header fields of the block being processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: i64,
    /// Block time in unix seconds.
    pub time: u64,
    pub chain_id: String,
    pub hash: Vec<u8>,
    pub proposer: Address,
}

/// What a handler sees: the header, a store view and an event sink.
pub struct Context<'a> {
    header: BlockHeader,
    store: &'a mut dyn KvStore,
    events: Vec<Event>,
    /// Hash of the transaction being executed; empty outside tx execution.
    tx_hash: Vec<u8>,
}

impl<'a> Context<'a> {
    pub fn new(header: BlockHeader, store: &'a mut dyn KvStore) -> Self {
        Self {
            header,
            store,
            events: Vec::new(),
            tx_hash: Vec::new(),
        }
    }

    /// Scope the context to one transaction.
    pub fn set_tx_hash(&mut self, tx_hash: impl Into<Vec<u8>>) {
        self.tx_hash = tx_hash.into();
    }

    pub fn tx_hash(&self) -> &[u8] {
        &self.tx_hash
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn height(&self) -> i64 {
        self.header.height
    }

    pub fn block_time(&self) -> u64 {
        self.header.time
    }

    pub fn chain_id(&self) -> &str {
        &self.header.chain_id
    }

    pub fn store(&self) -> &dyn KvStore {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn KvStore {
        &mut *self.store
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Run `f` on a cache-wrapped child context.
    ///
    /// Writes and events reach `self` only when `f` returns `Ok`.
    pub fn with_cache<T, E>(
        &mut self,
        f: impl FnOnce(&mut Context<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let header = self.header.clone();
        let mut cache = CacheStore::new(&mut *self.store);
        let mut child = Context::new(header, &mut cache);
        child.set_tx_hash(self.tx_hash.clone());
        let result = f(&mut child);
        let events = child.take_events();
        drop(child);

        match result {
            Ok(value) => {
                cache.commit()?;
                self.events.extend(events);
                Ok(value)
            }
            Err(e) => {
                cache.discard();
                Err(e)
            }
        }
    }

    /// Run `f` on a cache-wrapped child context whose writes and events are
    /// always thrown away.
    pub fn with_discarded_cache<T>(&mut self, f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let header = self.header.clone();
        let mut cache = CacheStore::new(&mut *self.store);
        let mut child = Context::new(header, &mut cache);
        child.set_tx_hash(self.tx_hash.clone());
        let result = f(&mut child);
        drop(child);
        cache.discard();
        result
    }
}
