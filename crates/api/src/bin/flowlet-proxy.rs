use std::sync::Arc;
use std::time::Duration;

use flowlet_api::config::ProxyConfig;
use flowlet_api::engine::proxy::UpstreamClient;
use flowlet_api::engine::Dispatcher;
use flowlet_api::router::build_proxy_router;
use flowlet_api::state::ProxyState;
use flowlet_api::{logging, server};
use flowlet_events::HttpCallbackNotifier;
use flowlet_worker::WorkerPool;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    logging::init_tracing();

    // --- Configuration ---
    let config = match ProxyConfig::from_env() {
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
        upstream_url = %config.upstream_url,
        "Loaded proxy configuration",
    );

    // --- Outbound HTTP clients ---
    let clients = HttpCallbackNotifier::new(Duration::from_secs(
        config.server.callback_timeout_secs,
    ))
    .map_err(|e| e.to_string())
    .and_then(|notifier| {
        UpstreamClient::new(
            config.upstream_url.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )
        .map(|upstream| (notifier, upstream))
        .map_err(|e| e.to_string())
    });
    let (notifier, upstream) = match clients {
        Ok(clients) => clients,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build HTTP clients");
            std::process::exit(1);
        }
    };

    // --- Worker pool ---
    let pool = Arc::new(WorkerPool::new(config.server.worker_pool_size));

    // --- App state ---
    let state = ProxyState {
        dispatcher: Dispatcher::new(pool.clone(), Arc::new(notifier)),
        upstream: Arc::new(upstream),
    };

    let app = build_proxy_router(state, &config.server);

    if let Err(e) = server::serve(app, &config.server, pool).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
