//! Shared application router builders.
//!
//! Both the production binaries and the integration tests
//! (`tests/common/mod.rs`) build their routers here, so tests exercise the
//! exact middleware stack that production uses.

use std::time::Duration;

use axum::http::{HeaderName, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::{AppState, ProxyState};

/// Executor service: `/health` and `POST /executor.json`.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .merge(routes::health::router())
        .merge(routes::executor::router())
        .with_state(state);
    with_middleware(router, config)
}

/// Proxy service: every method and path is forwarded upstream.
pub fn build_proxy_router(state: ProxyState, config: &ServerConfig) -> Router {
    let router = routes::proxy::router().with_state(state);
    with_middleware(router, config)
}

/// Layers run outermost first: assign `x-request-id`, trace, echo the id
/// on the response, then the request timeout and panic-to-500 guard.
fn with_middleware(router: Router, config: &ServerConfig) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    router
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
}
