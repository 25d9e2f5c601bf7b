//! Sync/async dispatch of work units.
//!
//! [`Dispatcher::dispatch`] validates the task, then either runs the work
//! unit on the pool and waits for it (sync) or queues it and returns an
//! acknowledgement at once (async). In async mode the finished envelope is
//! handed to the [`CallbackNotifier`]. Callers only ever see the result
//! payload, the fixed failure envelope or the acknowledgement.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use flowlet_core::envelope::ResultEnvelope;
use flowlet_core::error::WorkError;
use flowlet_core::request::{DispatchMeta, Execution};
use flowlet_core::work_unit::{Payload, Task, WorkUnit};
use flowlet_events::CallbackNotifier;
use flowlet_worker::{panic_message, TaskPool, TaskPoolExt};
use futures::FutureExt;
use serde_json::Value;

use crate::logging::FAILURE_TAG;

/// Outcome of one dispatch on the request path.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// Sync execution finished: the unit's payload verbatim, or the fixed
    /// failure envelope.
    Responded(Value),
    /// Async execution queued; the result goes to the callback URL.
    Accepted,
    /// Validation failed; the unit never ran and no callback follows.
    Rejected,
}

impl Dispatched {
    /// The JSON body sent back to the caller.
    pub fn into_body(self) -> Value {
        match self {
            Self::Responded(body) => body,
            Self::Accepted => ResultEnvelope::accepted().into_value(),
            Self::Rejected => ResultEnvelope::processing_failed().into_value(),
        }
    }
}

/// Routes tasks to the worker pool and results to the caller.
///
/// Cheaply cloneable; both collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct Dispatcher {
    pool: Arc<dyn TaskPool>,
    notifier: Arc<dyn CallbackNotifier>,
}

impl Dispatcher {
    pub fn new(pool: Arc<dyn TaskPool>, notifier: Arc<dyn CallbackNotifier>) -> Self {
        Self { pool, notifier }
    }

    /// Validate and run `unit` on `payload` in the mode `meta` selects.
    pub async fn dispatch(
        &self,
        meta: &DispatchMeta,
        payload: Payload,
        unit: Arc<dyn WorkUnit>,
    ) -> Dispatched {
        let task = Task::from_meta(payload, meta);

        if let Err(e) = unit.validate(&task) {
            log_failure(unit.name(), &e);
            return Dispatched::Rejected;
        }

        if meta.is_async_downgraded() {
            tracing::warn!(
                unit = unit.name(),
                "Async mode requested without a usable callback URL, running sync",
            );
        }

        match meta.execution() {
            Execution::Sync => self.run_sync(unit, task).await,
            Execution::Async { callback_url } => self.run_async(unit, task, callback_url),
        }
    }

    async fn run_sync(&self, unit: Arc<dyn WorkUnit>, task: Task) -> Dispatched {
        let name = unit.name().to_string();
        tracing::debug!(unit = %name, "Running work unit (sync)");

        let outcome = match self.pool.run(invoke(unit, task)).await {
            Ok(result) => result,
            Err(pool_err) => Err(WorkError::Failed(pool_err.to_string())),
        };

        match outcome {
            Ok(payload) => Dispatched::Responded(Value::Object(payload)),
            Err(e) => {
                log_failure(&name, &e);
                Dispatched::Responded(ResultEnvelope::processing_failed().into_value())
            }
        }
    }

    fn run_async(&self, unit: Arc<dyn WorkUnit>, task: Task, callback_url: String) -> Dispatched {
        tracing::debug!(unit = unit.name(), callback_url = %callback_url, "Queueing work unit (async)");

        let notifier = Arc::clone(&self.notifier);
        self.pool.submit(Box::pin(async move {
            let name = unit.name().to_string();
            let envelope = match invoke(unit, task).await {
                Ok(payload) => ResultEnvelope::success(payload),
                Err(e) => {
                    log_failure(&name, &e);
                    ResultEnvelope::processing_failed()
                }
            };
            // Delivery failures are logged by the notifier.
            let _ = notifier.deliver(&callback_url, &envelope).await;
        }));

        Dispatched::Accepted
    }
}

/// Execute `unit`, turning a panic into [`WorkError::Panicked`].
async fn invoke(unit: Arc<dyn WorkUnit>, task: Task) -> Result<Payload, WorkError> {
    match AssertUnwindSafe(unit.execute(task)).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(WorkError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn log_failure(unit: &str, error: &WorkError) {
    tracing::error!(
        error_tag = FAILURE_TAG,
        unit,
        kind = error.kind(),
        error = %error,
        "Work unit processing failed",
    );
}
