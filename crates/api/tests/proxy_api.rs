//! End-to-end tests for the proxy service against a local upstream.

mod common;

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use common::{get, next_callback, ok_json, post_json, spawn_callback_receiver};
use serde_json::{json, Value};

/// Upstream that echoes what it received, with a few special paths.
async fn upstream(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    match uri.path() {
        "/list" => Json(json!([1, 2, 3])).into_response(),
        "/fail" => (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response(),
        "/text" => "plain text".into_response(),
        _ => {
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            Json(json!({
                "method": method.as_str(),
                "path": uri.path(),
                "query": uri.query(),
                "body": String::from_utf8_lossy(&body),
                "x_mode": header("x-mode"),
                "x_callback_url": header("x-callback-url"),
                "x_custom": header("x-custom"),
            }))
            .into_response()
        }
    }
}

async fn spawn_upstream() -> String {
    let app = Router::new().fallback(upstream);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn failure_body() -> Value {
    json!({"result_type": "FAILED", "error_msg": "Executor processing failed"})
}

// ---------------------------------------------------------------------------
// Test: method, path, query, body and headers are forwarded
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forwards_request_and_returns_upstream_json() {
    let app = common::build_test_proxy(&spawn_upstream().await);

    let response = post_json(
        app,
        "/v1/infer?model=small&n=2",
        r#"{"prompt":"hi"}"#,
        &[("x-custom", "kept")],
    )
    .await;

    let body = ok_json(response).await;
    assert_eq!(body["method"], "POST");
    assert_eq!(body["path"], "/v1/infer");
    assert_eq!(body["query"], "model=small&n=2");
    assert_eq!(body["body"], r#"{"prompt":"hi"}"#);
    assert_eq!(body["x_custom"], "kept");
}

// ---------------------------------------------------------------------------
// Test: dispatch headers never reach the upstream
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatch_headers_are_stripped() {
    let (callback_url, mut callbacks) = spawn_callback_receiver().await;
    let app = common::build_test_proxy(&spawn_upstream().await);

    let response = post_json(
        app,
        "/echo",
        r#"{"a":1}"#,
        &[("X-Mode", "async"), ("X-Callback-Url", callback_url.as_str())],
    )
    .await;

    assert_eq!(ok_json(response).await, json!({"result_type": "SUCCESS"}));

    let (_, body) = next_callback(&mut callbacks).await;
    assert_eq!(body["result_type"], "SUCCESS");
    assert_eq!(body["path"], "/echo");
    assert_eq!(body["x_mode"], Value::Null);
    assert_eq!(body["x_callback_url"], Value::Null);
}

// ---------------------------------------------------------------------------
// Test: GET requests and non-JSON bodies are forwarded too
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_requests_are_forwarded() {
    let app = common::build_test_proxy(&spawn_upstream().await);

    let body = ok_json(get(app, "/status?verbose=1").await).await;

    assert_eq!(body["method"], "GET");
    assert_eq!(body["path"], "/status");
    assert_eq!(body["query"], "verbose=1");
}

#[tokio::test]
async fn non_json_body_is_forwarded_verbatim() {
    let app = common::build_test_proxy(&spawn_upstream().await);

    let body = ok_json(post_json(app, "/raw", "just text", &[]).await).await;

    assert_eq!(body["body"], "just text");
}

// ---------------------------------------------------------------------------
// Test: non-object upstream JSON is wrapped
// ---------------------------------------------------------------------------

#[tokio::test]
async fn non_object_response_is_wrapped() {
    let app = common::build_test_proxy(&spawn_upstream().await);

    let body = ok_json(get(app, "/list").await).await;

    assert_eq!(body, json!({"result": [1, 2, 3]}));
}

// ---------------------------------------------------------------------------
// Test: upstream failures become the failure envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upstream_error_status_is_a_failure() {
    let app = common::build_test_proxy(&spawn_upstream().await);

    let body = ok_json(post_json(app, "/fail", "{}", &[]).await).await;

    assert_eq!(body, failure_body());
    assert!(!body.to_string().contains("model crashed"));
}

#[tokio::test]
async fn non_json_upstream_response_is_a_failure() {
    let app = common::build_test_proxy(&spawn_upstream().await);

    let body = ok_json(get(app, "/text").await).await;

    assert_eq!(body, failure_body());
}

#[tokio::test]
async fn unreachable_upstream_calls_back_with_failure() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (callback_url, mut callbacks) = spawn_callback_receiver().await;
    let app = common::build_test_proxy(&format!("http://{addr}"));

    let response = post_json(
        app,
        "/infer",
        r#"{"a":1}"#,
        &[("x-mode", "async"), ("x-callback-url", callback_url.as_str())],
    )
    .await;

    assert_eq!(ok_json(response).await, json!({"result_type": "SUCCESS"}));
    let (_, body) = next_callback(&mut callbacks).await;
    assert_eq!(body, failure_body());
    common::assert_no_callback(&mut callbacks, Duration::from_millis(200)).await;
}
