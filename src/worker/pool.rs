//! Worker Pool
//!
//! Fixed set of OS threads pulling from a bounded queue. Submitting to a
//! full queue runs the task on the caller's thread instead of blocking, so
//! callers must tolerate inline execution.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::worker::TaskHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Lower clamp on the worker count.
pub const DEFAULT_MIN_WORKERS: usize = 2;
/// Upper clamp on the worker count.
pub const DEFAULT_MAX_WORKERS: usize = 16;
/// Queue slots per worker.
pub const QUEUE_SLOTS_PER_WORKER: usize = 4;

/// Worker count for a host with `parallelism` hardware threads.
pub fn worker_count_for(parallelism: usize, min: usize, max: usize) -> usize {
    parallelism.max(min).min(max).max(1)
}

// == Dispatch ==
/// How a submitted task was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Placed on the queue for a worker
    Queued,
    /// Queue was full; ran to completion on the caller's thread
    Inline,
    /// Pool already closed; the task was dropped without running
    Rejected,
}

// == Worker Pool ==
pub struct WorkerPool {
    workers: usize,
    capacity: usize,
    sender: RwLock<Option<Sender<Job>>>,
    threads: Mutex<Vec<thread::JoinHandle<()>>>,
    active: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl WorkerPool {
    /// Pool sized from the host's available parallelism, clamped to the
    /// default bounds.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MIN_WORKERS, DEFAULT_MAX_WORKERS)
    }

    /// Pool sized from the host's available parallelism, clamped to
    /// `[min, max]`.
    pub fn with_limits(min: usize, max: usize) -> Self {
        let parallelism = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::with_workers(worker_count_for(parallelism, min, max))
    }

    /// Pool with exactly `workers` threads and a queue of `4 * workers`.
    pub fn with_workers(workers: usize) -> Self {
        let workers = workers.max(1);
        let capacity = workers * QUEUE_SLOTS_PER_WORKER;
        let (tx, rx) = bounded::<Job>(capacity);
        let active = Arc::new(AtomicUsize::new(0));

        let mut threads = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let active = Arc::clone(&active);
            let spawned = thread::Builder::new()
                .name(format!("vfs-worker-{id}"))
                .spawn(move || worker_loop(id, rx, active));
            match spawned {
                Ok(handle) => threads.push(handle),
                Err(err) => error!(worker = id, error = %err, "Failed to spawn worker thread"),
            }
        }

        let spawned = threads.len();
        info!(workers = spawned, queue_capacity = capacity, "Worker pool started");

        Self {
            workers: spawned,
            capacity,
            // Without any worker the queue would never drain, so every
            // submission runs inline instead.
            sender: RwLock::new((spawned > 0).then_some(tx)),
            threads: Mutex::new(threads),
            active,
            closed: AtomicBool::new(false),
        }
    }

    // == Submit ==
    /// Enqueues `task`, or runs it on the calling thread when the queue is
    /// full. May therefore block for the full duration of the task.
    pub fn submit<F>(&self, task: F) -> Dispatch
    where
        F: FnOnce() + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            warn!("Task submitted to a closed worker pool was dropped");
            return Dispatch::Rejected;
        }

        let job: Job = Box::new(task);
        let overflow = {
            let guard = self.sender.read();
            match guard.as_ref() {
                Some(tx) => match tx.try_send(job) {
                    Ok(()) => return Dispatch::Queued,
                    Err(TrySendError::Full(job)) => job,
                    Err(TrySendError::Disconnected(_)) => {
                        warn!("Task submitted to a closed worker pool was dropped");
                        return Dispatch::Rejected;
                    }
                },
                None if self.closed.load(Ordering::Acquire) => {
                    warn!("Task submitted to a closed worker pool was dropped");
                    return Dispatch::Rejected;
                }
                None => job,
            }
        };

        debug!("Worker queue saturated, running task inline");
        run_guarded(overflow);
        Dispatch::Inline
    }

    // == Submit With Result ==
    /// Like [`submit`](Self::submit), but the task's return value is
    /// delivered exactly once through the returned handle.
    pub fn submit_with_result<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(move || {
            let _ = tx.send(task());
        });
        TaskHandle::new(rx)
    }

    // == Introspection ==
    /// Tasks currently executing on worker threads (queued tasks excluded).
    pub fn active_workers(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks waiting in the queue.
    pub fn queued(&self) -> usize {
        self.sender.read().as_ref().map_or(0, Sender::len)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // == Close ==
    /// Stops accepting work, lets queued and in-flight tasks finish, then
    /// joins every worker. Idempotent. Must not be called from a task
    /// running on this pool.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.sender.write().take();

        let threads: Vec<_> = self.threads.lock().drain(..).collect();
        for handle in threads {
            if handle.join().is_err() {
                error!("Worker thread exited abnormally");
            }
        }
        info!("Worker pool closed");
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("capacity", &self.capacity)
            .field("active", &self.active_workers())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn worker_loop(id: usize, rx: Receiver<Job>, active: Arc<AtomicUsize>) {
    for job in rx.iter() {
        active.fetch_add(1, Ordering::AcqRel);
        run_guarded(job);
        active.fetch_sub(1, Ordering::AcqRel);
    }
    debug!(worker = id, "Worker exiting");
}

/// Runs a job, containing any panic so the executing thread survives.
fn run_guarded(job: Job) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(panic = %message, "Pooled task panicked");
    }
}
