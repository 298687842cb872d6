//! Capacity-capped ABI cache with least-recently-used eviction.
//!
//! Owned and mutated by the single consumer thread, so there is no
//! interior locking. Recency is a per-cache logical tick rather than a
//! wall clock: every hit or insert stamps the entry with the next tick,
//! and eviction removes exactly the entry with the smallest stamp.

use crate::abi::AbiDef;
use crate::name::AccountName;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct CacheEntry {
    abi: Arc<AbiDef>,
    last_accessed: u64,
}

/// LRU map from account name to its ABI.
#[derive(Debug)]
pub struct AbiCache {
    capacity: usize,
    tick: u64,
    entries: HashMap<AccountName, CacheEntry>,
}

impl AbiCache {
    /// `capacity` must be nonzero; the pipeline config validates this
    /// before construction.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tick: 0,
            entries: HashMap::with_capacity(capacity.min(4096)),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Read-with-touch: a hit bumps the entry to most recently used.
    pub fn lookup(&mut self, account: &AccountName) -> Option<Arc<AbiDef>> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(account)?;
        entry.last_accessed = tick;
        Some(Arc::clone(&entry.abi))
    }

    /// Insert or replace. When a new key would push the cache past
    /// capacity, the least recently used entry is evicted first; exactly
    /// one removal per insert.
    pub fn insert(&mut self, account: AccountName, abi: Arc<AbiDef>) {
        if !self.entries.contains_key(&account) && self.entries.len() >= self.capacity {
            self.evict_one();
        }
        let tick = self.next_tick();
        self.entries.insert(account, CacheEntry { abi, last_accessed: tick });
    }

    fn evict_one(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(account, _)| *account);
        if let Some(account) = victim {
            tracing::debug!(account = %account, "evicting least recently used ABI");
            self.entries.remove(&account);
        }
    }

    pub fn contains(&self, account: &AccountName) -> bool {
        self.entries.contains_key(account)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
