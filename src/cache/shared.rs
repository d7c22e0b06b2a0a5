//! Shared Cache Handle
//!
//! Cloneable, thread-safe front for [`CacheStore`]. The entry map and the
//! recency order are always mutated together under one exclusive lock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::{CacheStats, CacheStore};

// == Cache ==
/// Thread-safe bounded TTL cache shared by request handlers and workers.
///
/// No method fails: a miss is `None`, and eviction is always safe.
#[derive(Debug)]
pub struct Cache<V> {
    inner: Arc<RwLock<CacheStore<V>>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> Cache<V> {
    pub fn new(max_size: u64, max_items: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheStore::new(max_size, max_items))),
        }
    }

    /// Live lookup with promotion.
    ///
    /// Expiry check, eviction and promotion happen in a single exclusive
    /// critical section, so an expired entry can never be promoted.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.write().get(key)
    }

    /// Inserts or replaces `key` with a caller-declared `size` in bytes.
    pub fn set(&self, key: impl Into<String>, value: V, size: u64, ttl: Duration) {
        self.inner.write().set(key, value, size, ttl);
    }

    /// Removes every entry whose key starts with `prefix`, atomically with
    /// respect to other cache operations.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.inner.write().invalidate_prefix(prefix)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.inner.write().remove(key)
    }

    /// Batch-evicts all expired entries under one critical section.
    pub fn sweep_expired(&self) -> usize {
        self.inner.write().sweep_expired()
    }

    /// `(entry count, total declared size)` snapshot.
    pub fn usage(&self) -> (usize, u64) {
        self.inner.read().usage()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.read().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
