//! `POST /executor.json`: run the configured work unit.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use flowlet_core::work_unit::parse_payload;
use serde_json::Value;

use crate::engine::meta::meta_from_headers;
use crate::engine::Dispatched;
use crate::logging::{redacted_headers, FAILURE_TAG};
use crate::state::AppState;

async fn execute(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Dispatched {
    let meta = meta_from_headers(&headers);

    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::info!(headers = %redacted_headers(&headers), "Executor request received");
            tracing::error!(
                error_tag = FAILURE_TAG,
                unit = state.executor.name(),
                error = %e,
                "Rejected request body",
            );
            return Dispatched::Rejected;
        }
    };

    let logged_payload = Value::Object(payload.clone());
    tracing::info!(
        mode = %meta.requested_mode,
        headers = %redacted_headers(&headers),
        payload = %logged_payload,
        "Executor request received",
    );

    state
        .dispatcher
        .dispatch(&meta, payload, Arc::clone(&state.executor))
        .await
}

pub fn router() -> Router<AppState> {
    Router::new().route("/executor.json", post(execute))
}
