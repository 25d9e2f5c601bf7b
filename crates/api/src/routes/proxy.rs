//! Catch-all forwarding handler for the proxy service.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::Router;
use flowlet_core::work_unit::{parse_payload, Payload};

use crate::engine::meta::meta_from_headers;
use crate::engine::proxy::{ProxyRequest, ProxyWorkUnit};
use crate::engine::Dispatched;
use crate::logging::{body_preview, redacted_headers};
use crate::state::ProxyState;

/// Forward any method on any path through the dispatcher.
async fn forward(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Dispatched {
    let meta = meta_from_headers(&headers);

    tracing::info!(
        %method,
        path = uri.path(),
        mode = %meta.requested_mode,
        headers = %redacted_headers(&headers),
        body_len = body.len(),
        body = %body_preview(&body),
        "Proxy request received",
    );

    // Only JSON object bodies are visible to the task; the raw bytes are
    // what is forwarded.
    let payload = parse_payload(&body).unwrap_or_else(|_| Payload::new());
    let request = ProxyRequest::new(method, uri.path(), uri.query(), &headers, body);
    let unit = ProxyWorkUnit::new(Arc::clone(&state.upstream), request);

    state.dispatcher.dispatch(&meta, payload, Arc::new(unit)).await
}

pub fn router() -> Router<ProxyState> {
    Router::new().fallback(forward)
}
