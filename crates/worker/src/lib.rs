//! Bounded worker pool for running work off the request path.
//!
//! - [`TaskPool`] -- the injectable submission seam.
//! - [`TaskPoolExt`] -- submit-and-await on top of any pool.
//! - [`WorkerPool`] -- fixed set of Tokio workers draining a FIFO queue.

pub mod pool;

pub use pool::{panic_message, Job, PoolError, PoolStats, TaskPool, TaskPoolExt, WorkerPool};
