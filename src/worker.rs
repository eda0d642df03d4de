//! Single background worker and the handles of its pending operations
//!
//! The [`Worker`] owns one OS thread running a current-thread tokio runtime.
//! Submitted operations wait in a bounded queue and run strictly one at a
//! time, in submission order. Each submission returns a [`PendingOperation`]
//! that resolves to the operation's value or error.
//!
//! ```
//! use drive_gateway::config::WorkerConfig;
//! use drive_gateway::worker::Worker;
//!
//! # fn main() -> drive_gateway::Result<()> {
//! let worker = Worker::spawn(&WorkerConfig::default())?;
//!
//! let answer = worker.submit(async { Ok(6 * 7) });
//! assert_eq!(answer.wait()?, 42);
//!
//! worker.shutdown()
//! # }
//! ```

use crate::config::WorkerConfig;
use crate::error::{Error, Result};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Dedicated execution context that serializes every submitted operation
pub struct Worker {
    tx: Option<mpsc::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
    capacity: usize,
}

impl Worker {
    /// Start the worker thread
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the runtime or the thread cannot be created.
    pub fn spawn(config: &WorkerConfig) -> Result<Self> {
        let capacity = config.queue_capacity.max(1);
        let (tx, rx) = mpsc::channel::<Job>(capacity);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run(runtime, rx))?;

        tracing::debug!(thread = %config.thread_name, capacity, "gateway worker spawned");

        Ok(Self {
            tx: Some(tx),
            thread: Some(thread),
            capacity,
        })
    }

    /// Queue an operation without blocking the caller
    ///
    /// The returned handle is already failed with [`Error::QueueFull`] when the
    /// queue is saturated, or [`Error::ShuttingDown`] when the worker is gone.
    /// An operation that panics resolves to [`Error::Aborted`] and leaves the
    /// worker running.
    pub fn submit<T, F>(&self, operation: F) -> PendingOperation<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let Some(tx) = &self.tx else {
            return PendingOperation::failed(Error::ShuttingDown);
        };

        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            match AssertUnwindSafe(operation).catch_unwind().await {
                // Caller may have dropped its handle; the work still ran
                Ok(result) => {
                    let _ = result_tx.send(result);
                }
                Err(_) => tracing::error!("gateway operation panicked"),
            }
        });

        match tx.try_send(job) {
            Ok(()) => PendingOperation::waiting(result_rx),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(capacity = self.capacity, "gateway work queue full");
                PendingOperation::failed(Error::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                PendingOperation::failed(Error::ShuttingDown)
            }
        }
    }

    /// Capacity of the work queue
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stop accepting work, finish everything already queued and join the thread
    ///
    /// This blocks the calling thread until the queue has drained.
    pub fn shutdown(mut self) -> Result<()> {
        tracing::info!("shutting down gateway worker");
        drop(self.tx.take());

        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| Error::Aborted)?;
        }
        tracing::info!("gateway worker stopped");
        Ok(())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Closing the queue lets the thread drain it and exit on its own
        drop(self.tx.take());
    }
}

fn run(runtime: tokio::runtime::Runtime, mut rx: mpsc::Receiver<Job>) {
    runtime.block_on(async move {
        while let Some(job) = rx.recv().await {
            job.await;
        }
    });
    tracing::debug!("gateway worker queue closed");
}

/// Handle to one in-flight operation
///
/// Await it from async code, or call [`wait`](PendingOperation::wait) from a
/// plain thread. It resolves exactly once, to the value or to the error.
/// Dropping the handle does not cancel the operation.
#[must_use = "a pending operation's result is lost unless it is awaited or waited on"]
pub struct PendingOperation<T> {
    state: State<T>,
}

enum State<T> {
    Waiting(oneshot::Receiver<Result<T>>),
    Failed(Option<Error>),
    Taken,
}

impl<T> Unpin for PendingOperation<T> {}

impl<T> PendingOperation<T> {
    fn waiting(rx: oneshot::Receiver<Result<T>>) -> Self {
        Self {
            state: State::Waiting(rx),
        }
    }

    /// A handle that is already resolved to `error`
    pub fn failed(error: Error) -> Self {
        Self {
            state: State::Failed(Some(error)),
        }
    }

    /// Block the current thread until the operation completes
    ///
    /// # Panics
    ///
    /// Panics if called from within an async runtime; `.await` the handle there instead.
    pub fn wait(self) -> Result<T> {
        match self.state {
            State::Waiting(rx) => rx.blocking_recv().unwrap_or(Err(Error::Aborted)),
            State::Failed(error) => Err(error.unwrap_or(Error::Aborted)),
            State::Taken => Err(Error::Aborted),
        }
    }

    /// Take the result if the operation has completed, without blocking
    ///
    /// Returns `None` while the operation is still queued or running, and
    /// after the result has already been taken.
    pub fn try_take(&mut self) -> Option<Result<T>> {
        let result = match &mut self.state {
            State::Waiting(rx) => match rx.try_recv() {
                Ok(result) => result,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => Err(Error::Aborted),
            },
            State::Failed(error) => Err(error.take().unwrap_or(Error::Aborted)),
            State::Taken => return None,
        };
        self.state = State::Taken;
        Some(result)
    }
}

impl<T> Future for PendingOperation<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let result = match &mut this.state {
            State::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(result)) => result,
                Poll::Ready(Err(_)) => Err(Error::Aborted),
            },
            State::Failed(error) => Err(error.take().unwrap_or(Error::Aborted)),
            State::Taken => Err(Error::Aborted),
        };
        this.state = State::Taken;
        Poll::Ready(result)
    }
}

impl<T> std::fmt::Debug for PendingOperation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::Waiting(_) => "waiting",
            State::Failed(_) => "failed",
            State::Taken => "taken",
        };
        f.debug_struct("PendingOperation")
            .field("state", &state)
            .finish()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn worker_with_capacity(queue_capacity: usize) -> Worker {
        Worker::spawn(&WorkerConfig {
            queue_capacity,
            ..WorkerConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn wait_returns_value() {
        let worker = worker_with_capacity(4);
        assert_eq!(worker.submit(async { Ok("done") }).wait().unwrap(), "done");
        worker.shutdown().unwrap();
    }

    #[test]
    fn errors_reach_the_caller_unchanged() {
        let worker = worker_with_capacity(4);
        let op = worker.submit(async { Err::<(), _>(Error::empty_cursor()) });

        match op.wait() {
            Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handle_can_be_awaited_from_another_runtime() {
        let worker = worker_with_capacity(4);
        let value = worker.submit(async { Ok(7u8) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn operations_run_one_at_a_time_in_submission_order() {
        let worker = worker_with_capacity(16);
        let order = Arc::new(Mutex::new(Vec::new()));
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let order = Arc::clone(&order);
                let active = Arc::clone(&active);
                let max_active = Arc::clone(&max_active);
                worker.submit(async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_active.fetch_max(now, Ordering::SeqCst);
                    // Earlier jobs sleep longer; a concurrent worker would reorder them
                    tokio::time::sleep(Duration::from_millis(16 - 2 * i)).await;
                    order.lock().unwrap().push(i);
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.wait().unwrap()).collect();

        assert_eq!(results, (0..8).collect::<Vec<_>>());
        assert_eq!(*order.lock().unwrap(), (0..8).collect::<Vec<_>>());
        assert_eq!(max_active.load(Ordering::SeqCst), 1, "never two at once");
    }

    #[test]
    fn submissions_from_many_threads_are_serialized() {
        let worker = Arc::new(worker_with_capacity(64));
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let worker = Arc::clone(&worker);
                let active = Arc::clone(&active);
                let max_active = Arc::clone(&max_active);
                std::thread::spawn(move || {
                    let handles: Vec<_> = (0..8)
                        .map(|_| {
                            let active = Arc::clone(&active);
                            let max_active = Arc::clone(&max_active);
                            worker.submit(async move {
                                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                                max_active.fetch_max(now, Ordering::SeqCst);
                                tokio::task::yield_now().await;
                                active.fetch_sub(1, Ordering::SeqCst);
                                Ok(())
                            })
                        })
                        .collect();
                    handles.into_iter().for_each(|h| h.wait().unwrap());
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn full_queue_fails_the_new_submission() {
        let worker = worker_with_capacity(1);
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let running = worker.submit(async move {
            started_tx.send(()).unwrap();
            release_rx.await.ok();
            Ok(1)
        });
        started_rx.recv().unwrap();

        let queued = worker.submit(async { Ok(2) });
        let rejected = worker.submit(async { Ok(3) });

        assert!(matches!(
            rejected.wait(),
            Err(Error::QueueFull { capacity: 1 })
        ));

        release_tx.send(()).unwrap();
        assert_eq!(running.wait().unwrap(), 1);
        assert_eq!(queued.wait().unwrap(), 2);
    }

    #[test]
    fn panicking_operation_is_aborted_and_worker_survives() {
        let worker = worker_with_capacity(4);
        let boom = worker.submit(async {
            if true {
                panic!("collaborator blew up");
            }
            Ok(())
        });
        let after = worker.submit(async { Ok("still alive") });

        assert!(matches!(boom.wait(), Err(Error::Aborted)));
        assert_eq!(after.wait().unwrap(), "still alive");
    }

    #[test]
    fn dropped_worker_still_finishes_queued_operations() {
        let worker = worker_with_capacity(4);
        let op = worker.submit(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(5)
        });
        drop(worker);
        assert_eq!(op.wait().unwrap(), 5);
    }

    #[test]
    fn dropped_handle_does_not_cancel_the_operation() {
        let worker = worker_with_capacity(4);
        let ran = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&ran);
        drop(worker.submit(async move {
            flag.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        worker.shutdown().unwrap();

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn try_take_yields_the_result_once() {
        let worker = worker_with_capacity(4);
        let mut op = worker.submit(async { Ok(9) });

        let result = loop {
            if let Some(result) = op.try_take() {
                break result;
            }
            std::thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(result.unwrap(), 9);
        assert!(op.try_take().is_none());
    }

    #[test]
    fn failed_handle_is_ready_immediately() {
        let mut op = PendingOperation::<()>::failed(Error::ShuttingDown);
        assert!(matches!(op.try_take(), Some(Err(Error::ShuttingDown))));
    }

    #[test]
    fn pending_handle_polls_pending_until_released() {
        let worker = worker_with_capacity(4);
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let mut op = tokio_test::task::spawn(worker.submit(async move {
            release_rx.await.ok();
            Ok("released")
        }));

        tokio_test::assert_pending!(op.poll());
        release_tx.send(()).unwrap();

        let result = loop {
            if let Poll::Ready(result) = op.poll() {
                break result;
            }
            std::thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(result.unwrap(), "released");
    }

    #[test]
    fn capacity_is_reported() {
        let worker = worker_with_capacity(3);
        assert_eq!(worker.capacity(), 3);
    }
}
