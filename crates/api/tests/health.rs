//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, get};
use flowlet_core::units::SegmentMultiplier;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200 with status, version and pool stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok_with_pool_stats() {
    let app = common::build_test_app(Arc::new(SegmentMultiplier));
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["pool"]["size"], 4);
    assert_eq!(json["pool"]["active"], 0);
    assert_eq!(json["pool"]["queued"], 0);
}

// ---------------------------------------------------------------------------
// Test: Unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(Arc::new(SegmentMultiplier));
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: GET on the executor endpoint is not allowed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn executor_endpoint_rejects_get() {
    let app = common::build_test_app(Arc::new(SegmentMultiplier));
    let response = get(app, "/executor.json").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = common::build_test_app(Arc::new(SegmentMultiplier));
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );

    // The value should be a valid UUID (36 chars with hyphens).
    let id_str = request_id.unwrap().to_str().unwrap();
    assert_eq!(id_str.len(), 36, "x-request-id should be a UUID string");
}
