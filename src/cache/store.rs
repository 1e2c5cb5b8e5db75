//! LRU Cache Module
//!
//! Generic cache engine combining a key index with an arena-backed recency
//! list, bounded by entry count and by accounted bytes, with per-entry TTL.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::lru::SlotId;
use crate::cache::{CacheEntry, CacheStats, LruList};

/// Slots examined per read-lock acquisition when collecting expired keys.
pub const SWEEP_BATCH: usize = 256;

// == LRU Cache ==
/// Thread-safe LRU cache with count and byte bounds and per-entry TTL.
///
/// A bound of 0 means "unbounded" for that dimension. All state lives behind
/// one `RwLock`; `get` takes it exclusively because a hit reorders the list.
pub struct LruCache<V> {
    inner: RwLock<LruState<V>>,
    /// Maximum number of entries, 0 = unlimited
    capacity: usize,
    /// Maximum sum of entry sizes, 0 = unlimited
    max_bytes: u64,
}

struct LruState<V> {
    list: LruList<V>,
    index: HashMap<String, SlotId>,
    current_bytes: u64,
    stats: CacheStats,
}

impl<V> LruState<V> {
    fn remove_key(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let id = self.index.remove(key)?;
        let entry = self.list.remove(id)?;
        self.current_bytes -= entry.size_bytes;
        Some(entry)
    }

    fn over_bounds(&self, capacity: usize, max_bytes: u64) -> bool {
        (capacity > 0 && self.list.len() > capacity)
            || (max_bytes > 0 && self.current_bytes > max_bytes)
    }

    /// Pops from the tail until both bounds hold and returns the popped keys.
    /// The head (the entry just written) is never evicted, so a lone
    /// oversized entry stays.
    fn evict_overflow(&mut self, capacity: usize, max_bytes: u64) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.list.len() > 1 && self.over_bounds(capacity, max_bytes) {
            let Some(entry) = self.list.pop_back() else {
                break;
            };
            self.index.remove(&entry.key);
            self.current_bytes -= entry.size_bytes;
            self.stats.record_eviction();
            evicted.push(entry.key);
        }
        evicted
    }
}

impl<V: Clone> LruCache<V> {
    // == Constructor ==
    /// Creates a new cache.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, 0 for no count bound
    /// * `max_bytes` - Maximum total accounted size, 0 for no size bound
    pub fn new(capacity: usize, max_bytes: u64) -> Self {
        Self {
            inner: RwLock::new(LruState {
                list: LruList::new(),
                index: HashMap::new(),
                current_bytes: 0,
                stats: CacheStats::new(),
            }),
            capacity,
            max_bytes,
        }
    }

    // == Get ==
    /// Retrieves a value and marks it most recently used.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.inner.write();
        let state = &mut *guard;

        let Some(&id) = state.index.get(key) else {
            state.stats.record_miss();
            return None;
        };

        let expired = state.list.get(id).map_or(true, |entry| entry.is_expired());
        if expired {
            state.remove_key(key);
            state.stats.record_miss();
            state.stats.record_expiration();
            return None;
        }

        state.list.move_to_front(id);
        state.stats.record_hit();
        state.list.get(id).map(|entry| entry.value.clone())
    }

    // == Peek ==
    /// Reads a live value without touching recency or counters.
    pub fn peek(&self, key: &str) -> Option<V> {
        let state = self.inner.read();
        let id = *state.index.get(key)?;
        state
            .list
            .get(id)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores a value with its accounted size and TTL (zero = never expires).
    ///
    /// Overwriting refreshes value, size and expiry and moves the key to the
    /// head. Least recently used entries are then evicted until both bounds
    /// hold again.
    ///
    /// Returns the number of entries evicted.
    pub fn set(&self, key: impl Into<String>, value: V, size_bytes: u64, ttl: Duration) -> usize {
        self.insert(key, value, size_bytes, ttl).len()
    }

    /// Same as `set`, but returns the keys that were evicted.
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: V,
        size_bytes: u64,
        ttl: Duration,
    ) -> Vec<String> {
        let key = key.into();
        let evicted = {
            let mut guard = self.inner.write();
            let state = &mut *guard;

            match state.index.get(&key).copied() {
                Some(id) => {
                    if let Some(entry) = state.list.get_mut(id) {
                        let old_size = entry.refresh(value, size_bytes, ttl);
                        state.current_bytes -= old_size;
                        state.current_bytes += size_bytes;
                    }
                    state.list.move_to_front(id);
                }
                None => {
                    let entry = CacheEntry::new(key.clone(), value, size_bytes, ttl);
                    let id = state.list.push_front(entry);
                    state.index.insert(key, id);
                    state.current_bytes += size_bytes;
                }
            }

            state.evict_overflow(self.capacity, self.max_bytes)
        };

        if !evicted.is_empty() {
            debug!(evicted = evicted.len(), "evicted least recently used entries");
        }
        evicted
    }

    // == Delete ==
    /// Removes an entry. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.write().remove_key(key).is_some()
    }

    // == Contains ==
    /// Checks for a live entry without touching recency or counters.
    pub fn contains(&self, key: &str) -> bool {
        let state = self.inner.read();
        state
            .index
            .get(key)
            .and_then(|&id| state.list.get(id))
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Stats ==
    /// Returns a snapshot of counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.read();
        CacheStats {
            size: state.list.len(),
            current_bytes: state.current_bytes,
            ..state.stats
        }
    }

    // == Clear ==
    /// Drops every entry. Lifetime counters are kept.
    pub fn clear(&self) {
        let mut state = self.inner.write();
        state.list.clear();
        state.index.clear();
        state.current_bytes = 0;
    }

    // == Remove Where ==
    /// Removes every entry whose key matches `pred`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut state = self.inner.write();
        let matching: Vec<String> = state
            .index
            .keys()
            .filter(|key| pred(key.as_str()))
            .cloned()
            .collect();

        matching
            .iter()
            .filter(|key| state.remove_key(key).is_some())
            .count()
    }

    // == Expiry Sweep ==
    /// Keys of entries whose TTL has elapsed.
    ///
    /// The slot arena is scanned `SWEEP_BATCH` slots at a time, each batch
    /// under its own read lock, so a writer never waits for a full scan.
    /// Entries written between batches may be missed until the next sweep.
    pub fn expired_keys(&self) -> Vec<String> {
        let now = current_timestamp_ms();
        let mut keys = Vec::new();
        let mut start = 0;

        loop {
            let state = self.inner.read();
            let end = state.list.slot_count().min(start + SWEEP_BATCH);
            if start >= end {
                break;
            }
            keys.extend(
                state
                    .list
                    .entries_in(start..end)
                    .filter(|(_, entry)| entry.is_expired_at(now))
                    .map(|(_, entry)| entry.key.clone()),
            );
            start = end;
        }
        keys
    }

    /// Removes `key` only if it is still present and expired.
    pub fn remove_if_expired(&self, key: &str) -> bool {
        let mut guard = self.inner.write();
        let state = &mut *guard;

        let expired = state
            .index
            .get(key)
            .and_then(|&id| state.list.get(id))
            .is_some_and(|entry| entry.is_expired());
        if expired {
            state.remove_key(key);
            state.stats.record_expiration();
        }
        expired
    }

    /// Removes all expired entries, taking the write lock once per removal.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        self.expired_keys()
            .iter()
            .filter(|key| self.remove_if_expired(key))
            .count()
    }

    // == Accessors ==
    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .list
            .iter()
            .map(|(_, entry)| entry.key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().list.is_empty()
    }

    pub fn current_bytes(&self) -> u64 {
        self.inner.read().current_bytes
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}
