//! Shared application state.

use std::sync::Arc;

use tracing::debug;

use crate::cache::keys::{self, SEARCH_PREFIX};
use crate::cache::Cache;
use crate::config::Config;
use crate::error::{Result, VfsError};
use crate::models::FileInfo;
use crate::vfs::{normalize_virtual, virtual_parent, Fingerprinter, PathResolver, RootsProvider};
use crate::worker::WorkerPool;

/// Values held by the response cache.
#[derive(Debug, Clone)]
pub enum CachedValue {
    Listing(Arc<Vec<FileInfo>>),
    Content(Arc<str>),
    Search(Arc<Vec<FileInfo>>),
}

/// Application state shared across all handlers.
///
/// Cloning is cheap; every field is a handle onto shared state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: PathResolver,
    pub fingerprinter: Fingerprinter,
    pub cache: Cache<CachedValue>,
    pub pool: Arc<WorkerPool>,
}

impl AppState {
    /// Builds the cache, pool and resolver from the configuration.
    pub fn from_config(config: Config) -> Self {
        let pool = WorkerPool::with_limits(config.worker_min, config.worker_max);
        Self::with_pool(config, pool)
    }

    /// Same as [`from_config`](Self::from_config) with an explicit pool.
    pub fn with_pool(config: Config, pool: WorkerPool) -> Self {
        let config = Arc::new(config);
        let roots: Arc<dyn RootsProvider> = config.clone();
        let resolver = PathResolver::new(roots);

        Self {
            cache: Cache::new(config.cache_max_size, config.cache_max_items),
            fingerprinter: Fingerprinter::new(resolver.clone()),
            resolver,
            pool: Arc::new(pool),
            config,
        }
    }

    /// Runs `task` as a single pooled task and waits for its result.
    ///
    /// Submission happens on tokio's blocking threads, so when the queue is
    /// full the inline run never occupies an executor thread.
    pub async fn run_pooled<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        let handle = tokio::task::spawn_blocking(move || pool.submit_with_result(task))
            .await
            .map_err(|err| VfsError::TaskFailed(err.to_string()))?;
        handle.await?
    }

    /// Runs `task` on tokio's blocking threads. Used for operations that
    /// fan out onto the pool and wait for it, which must not themselves
    /// occupy a pool worker.
    pub async fn run_fan_out<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&PathResolver, &WorkerPool) -> Result<T> + Send + 'static,
    {
        let resolver = self.resolver.clone();
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || task(&resolver, pool.as_ref()))
            .await
            .map_err(|err| VfsError::TaskFailed(err.to_string()))?
    }

    /// Drops every cache entry a change at `virtual_path` can make stale:
    /// contents and listings at or below it, the parent's listing, and all
    /// search results.
    pub fn invalidate_path(&self, virtual_path: &str) {
        let path = normalize_virtual(virtual_path);
        let removed = self.cache.invalidate_prefix(&keys::content_tree_prefix(&path))
            + self.cache.invalidate_prefix(&keys::listing_tree_prefix(&path))
            + self
                .cache
                .invalidate_prefix(&keys::listing_prefix(&virtual_parent(&path)))
            + self.cache.invalidate_prefix(SEARCH_PREFIX);
        debug!(path = %path, removed, "Invalidated cache entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn state() -> AppState {
        AppState::with_pool(Config::with_storage("/srv"), WorkerPool::with_workers(1))
    }

    #[test]
    fn test_invalidate_path_scope() {
        let state = state();
        let ttl = Duration::from_secs(60);
        let listing = || CachedValue::Listing(Arc::new(Vec::new()));

        state.cache.set(keys::listing_key("/docs", "f1"), listing(), 1, ttl);
        state.cache.set(keys::listing_key("/docs/sub", "f2"), listing(), 1, ttl);
        state.cache.set(keys::listing_key("/other", "f3"), listing(), 1, ttl);
        state.cache.set(keys::content_key("/docs/sub/a.md", 1), CachedValue::Content("x".into()), 1, ttl);
        state.cache.set(keys::search_key("a", "/", "current", false, false, 10), listing(), 1, ttl);

        state.invalidate_path("/docs/sub");

        assert!(state.cache.get(&keys::listing_key("/docs", "f1")).is_none());
        assert!(state.cache.get(&keys::listing_key("/docs/sub", "f2")).is_none());
        assert!(state.cache.get(&keys::content_key("/docs/sub/a.md", 1)).is_none());
        assert!(state.cache.get(&keys::listing_key("/other", "f3")).is_some());
        assert_eq!(state.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_saturated_pool_does_not_block_the_runtime() {
        let state = state();
        let (release_tx, release_rx) = crossbeam_channel::unbounded::<()>();

        let rx = release_rx.clone();
        state.pool.submit(move || {
            let _ = rx.recv();
        });
        while state.pool.active_workers() < 1 {
            std::thread::sleep(Duration::from_millis(1));
        }
        for _ in 0..state.pool.queue_capacity() {
            let rx = release_rx.clone();
            state.pool.submit(move || {
                let _ = rx.recv();
            });
        }

        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            state.run_pooled(|| {
                std::thread::sleep(Duration::from_millis(400));
                Ok(())
            }),
        )
        .await;
        assert!(outcome.is_err(), "timeout must fire while the task runs inline");
        assert!(started.elapsed() < Duration::from_millis(300));

        drop(release_tx);
    }

    #[tokio::test]
    async fn test_run_pooled_propagates_errors() {
        let state = state();
        assert_eq!(state.run_pooled(|| Ok(7)).await.unwrap(), 7);
        let err = state
            .run_pooled::<(), _>(|| Err(VfsError::BadRequest("nope".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, VfsError::BadRequest(_)));
    }
}
