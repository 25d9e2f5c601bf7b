//! Fixed-size worker pool backed by Tokio tasks.
//!
//! [`WorkerPool`] spawns `size` long-lived workers that pull boxed futures
//! from one unbounded FIFO queue. A worker runs one task at a time; a task
//! that panics is caught and logged and the worker moves on to the next one.
//!
//! The pool is an explicit service: build one in `main`, share it behind an
//! `Arc`, and hand it to whatever needs to run work off the request path.
//! Tests can substitute any other [`TaskPool`] implementation.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

/// A unit of work as the pool sees it: a zero-argument future.
pub type Job = BoxFuture<'static, ()>;

// ---------------------------------------------------------------------------
// TaskPool
// ---------------------------------------------------------------------------

/// Anything that can run boxed futures to completion in the background.
pub trait TaskPool: Send + Sync {
    /// Queue `task`; returns immediately.
    fn submit(&self, task: Job);
}

/// Errors surfaced to callers awaiting a pooled task.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The task panicked, or the pool was shut down before it ran.
    #[error("Pooled task did not complete")]
    TaskAborted,
}

/// Submit-and-await helpers available on every [`TaskPool`].
pub trait TaskPoolExt: TaskPool {
    /// Run `task` on the pool and wait for its output.
    ///
    /// The task is queued when `run` is called, not when the returned
    /// future is first polled.
    fn run<F>(&self, task: F) -> impl Future<Output = Result<F::Output, PoolError>> + Send
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.submit(Box::pin(async move {
            // The receiver may be gone if the caller stopped waiting.
            let _ = tx.send(task.await);
        }));
        async move { rx.await.map_err(|_| PoolError::TaskAborted) }
    }

    /// Run a blocking closure on Tokio's blocking threads while holding one
    /// pool slot, and wait for its output.
    fn run_blocking<F, T>(&self, f: F) -> impl Future<Output = Result<T, PoolError>> + Send
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let pending = self.run(tokio::task::spawn_blocking(f));
        async move {
            pending.await?.map_err(|e| {
                tracing::error!(error = %e, "Blocking task failed");
                PoolError::TaskAborted
            })
        }
    }
}

impl<P: TaskPool + ?Sized> TaskPoolExt for P {}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Slot usage snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Number of workers.
    pub size: usize,
    /// Workers currently running a task.
    pub active: usize,
    /// Tasks waiting for a free worker.
    pub queued: usize,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicUsize,
    active: AtomicUsize,
}

/// Fixed number of workers draining one FIFO queue.
pub struct WorkerPool {
    size: usize,
    sender: StdMutex<Option<mpsc::UnboundedSender<Job>>>,
    workers: StdMutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        let workers = (0..size)
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&rx), Arc::clone(&counters))))
            .collect();

        tracing::info!(size, "Worker pool started");

        Self {
            size,
            sender: StdMutex::new(Some(tx)),
            workers: StdMutex::new(workers),
            counters,
        }
    }

    /// Point-in-time view of slot usage and backlog.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.size,
            active: self.counters.active.load(Ordering::SeqCst),
            queued: self.counters.queued.load(Ordering::SeqCst),
        }
    }

    /// Stop accepting work and wait up to `timeout` for the workers to drain
    /// the queue. Returns `true` when everything finished in time.
    ///
    /// Later submissions are dropped with a warning.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        drop(self.lock_sender().take());
        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );

        let stats = self.stats();
        tracing::info!(
            active = stats.active,
            queued = stats.queued,
            "Draining worker pool",
        );

        match tokio::time::timeout(timeout, join_all(workers)).await {
            Ok(_) => {
                tracing::info!("Worker pool drained");
                true
            }
            Err(_) => {
                let stats = self.stats();
                tracing::warn!(
                    active = stats.active,
                    queued = stats.queued,
                    timeout_ms = timeout.as_millis() as u64,
                    "Worker pool did not drain before timeout",
                );
                false
            }
        }
    }

    fn lock_sender(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<Job>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskPool for WorkerPool {
    fn submit(&self, task: Job) {
        let sender = self.lock_sender();
        let Some(tx) = sender.as_ref() else {
            tracing::warn!("Worker pool is shut down, task dropped");
            return;
        };

        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        if tx.send(task).is_err() {
            self.counters.queued.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!("Worker pool queue is closed, task dropped");
        }
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
    counters: Arc<Counters>,
) {
    loop {
        // Idle workers line up on the lock; the holder waits for the next job.
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        counters.queued.fetch_sub(1, Ordering::SeqCst);
        counters.active.fetch_add(1, Ordering::SeqCst);

        if let Err(panic) = AssertUnwindSafe(job).catch_unwind().await {
            tracing::error!(
                worker = id,
                panic = %panic_message(panic.as_ref()),
                "Pooled task panicked",
            );
        }

        counters.active.fetch_sub(1, Ordering::SeqCst);
    }

    tracing::debug!(worker = id, "Worker stopped");
}

/// Best-effort text of a caught panic payload.
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
