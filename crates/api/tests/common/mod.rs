#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use flowlet_api::config::ServerConfig;
use flowlet_api::engine::proxy::UpstreamClient;
use flowlet_api::engine::Dispatcher;
use flowlet_api::router::{build_app_router, build_proxy_router};
use flowlet_api::state::{AppState, ProxyState};
use flowlet_core::work_unit::WorkUnit;
use flowlet_events::HttpCallbackNotifier;
use flowlet_worker::WorkerPool;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        worker_pool_size: 4,
        callback_timeout_secs: 5,
    }
}

fn test_dispatcher(pool: &Arc<WorkerPool>) -> Dispatcher {
    let notifier = HttpCallbackNotifier::new(Duration::from_secs(5)).unwrap();
    Dispatcher::new(pool.clone(), Arc::new(notifier))
}

/// Executor router serving `executor` with the production middleware stack.
pub fn build_test_app(executor: Arc<dyn WorkUnit>) -> Router {
    let config = test_config();
    let pool = Arc::new(WorkerPool::new(config.worker_pool_size));
    let state = AppState {
        dispatcher: test_dispatcher(&pool),
        pool,
        executor,
    };
    build_app_router(state, &config)
}

/// Proxy router forwarding to `upstream_url`.
pub fn build_test_proxy(upstream_url: &str) -> Router {
    let config = test_config();
    let pool = Arc::new(WorkerPool::new(config.worker_pool_size));
    let upstream = UpstreamClient::new(upstream_url, Duration::from_secs(5)).unwrap();
    let state = ProxyState {
        dispatcher: test_dispatcher(&pool),
        upstream: Arc::new(upstream),
    };
    build_proxy_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST `body` to `uri` with extra `headers`.
pub async fn post_json(app: Router, uri: &str, body: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a 200 response and return its JSON body.
pub async fn ok_json(response: Response) -> Value {
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Local callback receiver
// ---------------------------------------------------------------------------

/// A callback as received: request headers and JSON body.
pub type Received = (HeaderMap, Value);

/// Start a server accepting POSTs on `/callback`; returns its URL and the
/// stream of received callbacks.
pub async fn spawn_callback_receiver() -> (String, mpsc::UnboundedReceiver<Received>) {
    async fn record(
        State(tx): State<mpsc::UnboundedSender<Received>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let _ = tx.send((headers, body));
        StatusCode::OK
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().route("/callback", post(record)).with_state(tx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/callback"), rx)
}

/// Wait (bounded) for the next callback.
pub async fn next_callback(rx: &mut mpsc::UnboundedReceiver<Received>) -> Received {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for callback")
        .expect("callback receiver closed")
}

/// Assert that no callback arrives within `wait`.
pub async fn assert_no_callback(rx: &mut mpsc::UnboundedReceiver<Received>, wait: Duration) {
    if let Ok(Some((_, body))) = tokio::time::timeout(wait, rx.recv()).await {
        panic!("unexpected callback: {body}");
    }
}
