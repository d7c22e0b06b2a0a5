//! Single-use result handle for pooled tasks.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{Result, VfsError};

const LOST_RESULT: &str = "task panicked or the worker pool was closed";

/// Yields the value of a task submitted with
/// [`WorkerPool::submit_with_result`](crate::worker::WorkerPool::submit_with_result)
/// exactly once, whether it ran on a worker or inline.
///
/// Await it from async code, or call [`wait`](TaskHandle::wait) from a
/// plain thread.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Blocks the current thread until the task completes.
    ///
    /// Panics if called from within an async runtime context.
    pub fn wait(self) -> Result<T> {
        self.rx
            .blocking_recv()
            .map_err(|_| VfsError::TaskFailed(LOST_RESULT.to_string()))
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map_err(|_| VfsError::TaskFailed(LOST_RESULT.to_string()))
    }
}
