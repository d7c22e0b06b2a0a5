//! Cache Store Module
//!
//! Single-threaded cache engine: entry map, recency order and the byte/count
//! bounds. Thread safety lives one layer up in [`crate::cache::Cache`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, RecencyOrder};

// == Cache Store ==
/// Size- and count-bounded key/value store with per-entry TTL.
///
/// Invariants after every completed mutation:
/// - `cur_size` equals the sum of the declared sizes in `entries`
/// - `entries` and `order` hold exactly the same keys
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: RecencyOrder,
    stats: CacheStats,
    cur_size: u64,
    max_size: u64,
    max_items: usize,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store bounded by `max_size` bytes and `max_items`
    /// entries. A count bound of zero is treated as one.
    pub fn new(max_size: u64, max_items: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: RecencyOrder::new(),
            stats: CacheStats::new(),
            cur_size: 0,
            max_size,
            max_items: max_items.max(1),
        }
    }

    // == Get ==
    /// Returns a live entry's value and promotes it to most recently used.
    ///
    /// Expired entries are evicted on the spot and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            self.evict(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.order.promote(key);
        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Whether `key` holds a live entry. Does not promote or count.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    // == Set ==
    /// Inserts or replaces `key`, evicting from the least recently used end
    /// until both bounds hold for the new entry.
    ///
    /// Eviction stops once nothing else is left, so a single entry larger
    /// than `max_size` is still stored and is the only entry afterwards.
    /// Returns how many other entries were evicted.
    pub fn set(&mut self, key: impl Into<String>, value: V, size: u64, ttl: Duration) -> usize {
        let key = key.into();

        if let Some(previous) = self.entries.remove(&key) {
            self.cur_size -= previous.size;
            self.order.remove(&key);
        }

        let mut evicted = 0;
        while self.cur_size.saturating_add(size) > self.max_size
            || self.entries.len() >= self.max_items
        {
            let Some(victim) = self.order.pop_back() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&victim) {
                self.cur_size -= entry.size;
                evicted += 1;
            }
        }
        self.stats.record_evictions(evicted);

        if size > self.max_size {
            debug!(
                key = %key,
                size,
                max_size = self.max_size,
                "Storing entry larger than the cache byte bound"
            );
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, size, ttl));
        self.order.push_front(&key);
        self.cur_size += size;

        evicted
    }

    // == Remove ==
    /// Drops `key` if present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.evict(key)
    }

    // == Invalidate By Prefix ==
    /// Removes every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        for key in &doomed {
            self.evict(key);
        }
        doomed.len()
    }

    // == Sweep Expired ==
    /// Removes all expired entries in one pass. Returns how many were removed.
    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub(crate) fn sweep_expired_at(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.evict(key);
        }
        self.stats.record_expirations(expired.len());
        expired.len()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order = RecencyOrder::new();
        self.cur_size = 0;
    }

    // == Stats ==
    /// Counters plus current occupancy.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.entries = self.entries.len();
        stats.total_size = self.cur_size;
        stats
    }

    /// `(entry count, total declared size)`.
    pub fn usage(&self) -> (usize, u64) {
        (self.entries.len(), self.cur_size)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.cur_size
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.order.iter().map(str::to_string).collect()
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let summed: u64 = self.entries.values().map(|entry| entry.size).sum();
        assert_eq!(summed, self.cur_size, "cur_size drifted from entry sizes");
        assert_eq!(self.entries.len(), self.order.len(), "order and map disagree");
        for key in self.entries.keys() {
            assert!(self.order.contains(key), "key {key} missing from order");
        }
    }

    fn evict(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.cur_size -= entry.size;
                self.order.remove(key);
                true
            }
            None => false,
        }
    }
}
