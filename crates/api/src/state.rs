use std::sync::Arc;

use flowlet_core::work_unit::WorkUnit;
use flowlet_worker::WorkerPool;

use crate::engine::proxy::UpstreamClient;
use crate::engine::Dispatcher;

/// Shared state of the executor service, available to handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// The pool the dispatcher runs on, kept for health reporting.
    pub pool: Arc<WorkerPool>,
    /// Work unit behind `POST /executor.json`.
    pub executor: Arc<dyn WorkUnit>,
}

/// Shared state of the proxy service.
#[derive(Clone)]
pub struct ProxyState {
    pub dispatcher: Dispatcher,
    pub upstream: Arc<UpstreamClient>,
}
