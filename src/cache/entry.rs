//! Cache Entry Module
//!
//! A single cached payload with its declared size and time-to-live.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A cached value together with the bookkeeping needed for eviction.
///
/// The size is declared by the caller and never measured; the cache only
/// uses it to enforce its byte bound.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored payload
    pub value: V,
    /// When the entry was created
    pub created_at: Instant,
    /// Caller-declared size in bytes
    pub size: u64,
    /// How long the entry stays live
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped with the current instant.
    pub fn new(value: V, size: u64, ttl: Duration) -> Self {
        Self::created_at(value, size, ttl, Instant::now())
    }

    /// Creates an entry with an explicit creation instant.
    pub fn created_at(value: V, size: u64, ttl: Duration, created_at: Instant) -> Self {
        Self {
            value,
            created_at,
            size,
            ttl,
        }
    }

    // == Is Expired ==
    /// An entry is expired once strictly more than `ttl` has elapsed since
    /// creation. An entry checked exactly at its deadline is still live.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Expiry check against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }
}
