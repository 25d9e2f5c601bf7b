use std::sync::Arc;
use std::time::Duration;

use flowlet_api::config::ExecutorConfig;
use flowlet_api::engine::Dispatcher;
use flowlet_api::router::build_app_router;
use flowlet_api::state::AppState;
use flowlet_api::{build_executor_unit, logging, server};
use flowlet_events::HttpCallbackNotifier;
use flowlet_worker::WorkerPool;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    logging::init_tracing();

    // --- Configuration ---
    let config = match ExecutorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        worker_pool_size = config.server.worker_pool_size,
        work_dir = %config.work_dir.display(),
        "Loaded executor configuration",
    );

    // --- Callback notifier ---
    let notifier = match HttpCallbackNotifier::new(Duration::from_secs(
        config.server.callback_timeout_secs,
    )) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build callback HTTP client");
            std::process::exit(1);
        }
    };

    // --- Worker pool ---
    let pool = Arc::new(WorkerPool::new(config.server.worker_pool_size));

    // --- App state ---
    let state = AppState {
        dispatcher: Dispatcher::new(pool.clone(), notifier),
        pool: Arc::clone(&pool),
        executor: build_executor_unit(&config),
    };

    let app = build_app_router(state, &config.server);

    if let Err(e) = server::serve(app, &config.server, pool).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
