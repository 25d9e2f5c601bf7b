//! Forwarding of inbound requests to an upstream HTTP service.
//!
//! [`UpstreamClient`] owns the connection pool and the base URL. Each
//! request becomes a [`ProxyWorkUnit`] that replays method, path, query,
//! filtered headers and body against the upstream and returns its JSON
//! response as the result payload.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::header::{CONTENT_LENGTH, HOST};
use axum::http::{HeaderMap, Method};
use flowlet_core::error::WorkError;
use flowlet_core::request::is_dispatch_header;
use flowlet_core::work_unit::{Payload, Task, WorkUnit};
use serde_json::Value;

/// Field wrapping an upstream response that is not a JSON object.
pub const WRAPPED_RESULT_FIELD: &str = "result";

/// Errors from one upstream round trip.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The HTTP request itself failed (connect, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("Upstream error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The upstream answered 2xx with a body that is not JSON.
    #[error("Upstream returned invalid JSON: {0}")]
    Decode(String),
}

impl From<UpstreamError> for WorkError {
    fn from(err: UpstreamError) -> Self {
        WorkError::Upstream(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// ProxyRequest
// ---------------------------------------------------------------------------

/// The parts of an inbound request that are replayed upstream.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Already filtered with [`forwardable_headers`].
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    /// Capture an inbound request, dropping headers that must not be
    /// forwarded.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Option<&str>,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
            headers: forwardable_headers(headers),
            body,
        }
    }
}

/// Copy of `headers` without dispatch metadata, `host` and
/// `content-length`.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if name == HOST || name == CONTENT_LENGTH || is_dispatch_header(name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

// ---------------------------------------------------------------------------
// UpstreamClient
// ---------------------------------------------------------------------------

/// HTTP client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    /// * `base_url` - e.g. `http://model:9000`; a trailing slash is ignored.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `<base_url><path>?<query>`.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Replay `request` upstream and return the JSON response as a payload.
    pub async fn forward(&self, request: &ProxyRequest) -> Result<Payload, UpstreamError> {
        let url = self.target_url(&request.path, request.query.as_deref());
        tracing::debug!(method = %request.method, url = %url, "Forwarding request upstream");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if request.method != Method::GET && request.method != Method::HEAD {
            builder = builder.body(request.body.clone());
        }

        let response = Self::ensure_success(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        Ok(match value {
            Value::Object(map) => map,
            other => {
                let mut map = Payload::new();
                map.insert(WRAPPED_RESULT_FIELD.to_string(), other);
                map
            }
        })
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// ProxyWorkUnit
// ---------------------------------------------------------------------------

/// Work unit for one captured request. The task payload is only used for
/// logging; the raw body is what gets forwarded.
pub struct ProxyWorkUnit {
    upstream: Arc<UpstreamClient>,
    request: ProxyRequest,
}

impl ProxyWorkUnit {
    pub fn new(upstream: Arc<UpstreamClient>, request: ProxyRequest) -> Self {
        Self { upstream, request }
    }
}

#[async_trait]
impl WorkUnit for ProxyWorkUnit {
    fn name(&self) -> &str {
        "proxy"
    }

    /// Any body is forwarded as-is, including empty and non-JSON ones.
    fn validate(&self, _task: &Task) -> Result<(), WorkError> {
        Ok(())
    }

    async fn execute(&self, _task: Task) -> Result<Payload, WorkError> {
        Ok(self.upstream.forward(&self.request).await?)
    }
}
