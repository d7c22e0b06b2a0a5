//! Worker Pool Module
//!
//! Parallelizes blocking filesystem work across a fixed set of threads with
//! bounded-queue backpressure.

mod handle;
mod pool;

pub use handle::TaskHandle;
pub use pool::{
    worker_count_for, Dispatch, WorkerPool, DEFAULT_MAX_WORKERS, DEFAULT_MIN_WORKERS,
    QUEUE_SLOTS_PER_WORKER,
};
