//! Cache Module
//!
//! Bounded in-memory cache with per-entry TTL, least-recently-used eviction
//! and prefix invalidation. Used for directory listings, file contents and
//! search results.

mod entry;
pub mod keys;
mod recency;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use recency::RecencyOrder;
pub use shared::Cache;
pub use stats::CacheStats;
pub use store::CacheStore;

use std::time::Duration;

// == Public Constants ==
/// Default byte bound (250 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 250 * 1024 * 1024;

/// Default entry-count bound
pub const DEFAULT_MAX_ITEMS: usize = 15_000;

/// Default TTL for listings and contents
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default TTL for search results
pub const SEARCH_TTL: Duration = Duration::from_secs(2 * 60);

/// Period of the background expiry sweep
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Rough per-item size charged for cached listings and search results
pub const LISTING_ITEM_SIZE: u64 = 200;
