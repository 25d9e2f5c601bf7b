//! Bounded retry for work units.
//!
//! [`RetryPolicy`] re-runs an operation up to a fixed number of attempts
//! with no delay between them. [`Retrying`] applies a policy to any
//! [`WorkUnit`]: each attempt re-executes the unit from scratch with a fresh
//! copy of the task, and nothing from a failed attempt is reused.

use std::future::Future;

use async_trait::async_trait;

use crate::error::WorkError;
use crate::work_unit::{Payload, Task, WorkUnit};

/// Fixed-count retry without backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// A policy allowing `max_attempts` attempts in total (at least one).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// A single attempt.
    pub fn once() -> Self {
        Self::new(1)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. `op` receives the 1-based attempt number.
    ///
    /// Returns the last error when every attempt failed.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, WorkError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, WorkError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::error!(
                        label,
                        attempts = attempt,
                        error = %e,
                        "All attempts failed",
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Attempt failed, retrying",
                    );
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

// ---------------------------------------------------------------------------
// Retrying
// ---------------------------------------------------------------------------

/// A work unit wrapped in a [`RetryPolicy`].
pub struct Retrying<U> {
    inner: U,
    policy: RetryPolicy,
}

impl<U: WorkUnit> Retrying<U> {
    pub fn new(inner: U, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<U: WorkUnit> WorkUnit for Retrying<U> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn validate(&self, task: &Task) -> Result<(), WorkError> {
        self.inner.validate(task)
    }

    async fn execute(&self, task: Task) -> Result<Payload, WorkError> {
        let inner = &self.inner;
        let task = &task;
        self.policy
            .run(inner.name(), |_| inner.execute(task.clone()))
            .await
    }
}
