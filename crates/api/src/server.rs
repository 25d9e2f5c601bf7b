//! Serving and shutdown shared by both binaries.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use flowlet_worker::WorkerPool;

use crate::config::ServerConfig;

/// Bind, serve until SIGINT/SIGTERM, then drain the worker pool.
///
/// Work queued before the signal still runs (and still calls back) as long
/// as it finishes within `SHUTDOWN_TIMEOUT_SECS`.
pub async fn serve(app: Router, config: &ServerConfig, pool: Arc<WorkerPool>) -> std::io::Result<()> {
    let ip: IpAddr = config.host.parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid HOST {:?}: {e}", config.host),
        )
    })?;
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Listener closed, draining worker pool");
    if pool
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await
    {
        tracing::info!("Worker pool drained");
    }
    Ok(())
}

/// Resolves on the first SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!(signal = "SIGINT", "Shutting down");
        }
        () = terminate => {
            tracing::info!(signal = "SIGTERM", "Shutting down");
        }
    }
}
