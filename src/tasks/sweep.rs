//! Cache Expiry Sweep
//!
//! Background task that periodically evicts expired cache entries.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::Cache;

// == Sweep Handle ==
/// Owns the periodic sweep. Dropping the handle (or calling [`stop`])
/// cancels the task, so the sweep never outlives whoever started it.
///
/// [`stop`]: SweepHandle::stop
#[derive(Debug)]
pub struct SweepHandle {
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Cancels the sweep.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns the expiry sweep on the current tokio runtime.
///
/// Every `period` the whole cache is scanned and expired entries are removed
/// as one batch under the cache's exclusive lock.
pub fn spawn_sweep_task<V>(cache: Cache<V>, period: Duration) -> SweepHandle
where
    V: Clone + Send + Sync + 'static,
{
    let task = tokio::spawn(async move {
        info!(period_secs = period.as_secs_f64(), "Starting cache sweep task");

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let removed = cache.sweep_expired();
            if removed > 0 {
                info!(removed, "Cache sweep: evicted expired entries");
            } else {
                debug!("Cache sweep: no expired entries");
            }
        }
    });

    SweepHandle { task }
}
