//! Dispatch metadata carried next to the task payload.
//!
//! The orchestrator selects the execution mode with the `X-Mode` header and
//! names its callback endpoint with `X-Callback-Url`. Both are metadata for
//! the dispatcher and are never forwarded to upstream services.

use std::fmt;

/// Header selecting `sync` or `async` execution.
pub const MODE_HEADER: &str = "x-mode";

/// Header naming the URL that receives the async result.
pub const CALLBACK_URL_HEADER: &str = "x-callback-url";

/// Header carrying the language hint (`shell` routes to the shell unit).
pub const LANGUAGE_HINT_HEADER: &str = "language_type";

/// Headers that only steer dispatch.
pub const DISPATCH_HEADERS: [&str; 2] = [MODE_HEADER, CALLBACK_URL_HEADER];

/// Whether `name` is dispatch metadata (case-insensitive).
pub fn is_dispatch_header(name: &str) -> bool {
    DISPATCH_HEADERS
        .iter()
        .any(|header| header.eq_ignore_ascii_case(name))
}

// ---------------------------------------------------------------------------
// ExecutionMode
// ---------------------------------------------------------------------------

/// Mode requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Sync,
    Async,
}

impl ExecutionMode {
    /// Parse a header value. Absent or unrecognized values mean `Sync`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("async") => Self::Async,
            _ => Self::Sync,
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Async => f.write_str("async"),
        }
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Resolved execution path for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// Run the work unit and answer with its result.
    Sync,
    /// Acknowledge now, post the result to `callback_url` later.
    Async { callback_url: String },
}

// ---------------------------------------------------------------------------
// DispatchMeta
// ---------------------------------------------------------------------------

/// Transport metadata extracted from an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchMeta {
    /// Mode as requested, before the callback check.
    pub requested_mode: ExecutionMode,
    /// Callback URL, if one was supplied and usable.
    pub callback_url: Option<String>,
    /// Language hint (`language_type` header).
    pub language: Option<String>,
    /// Content type of the request body.
    pub content_type: Option<String>,
}

impl DispatchMeta {
    /// Build metadata from raw header values.
    ///
    /// A callback URL that is blank or not an absolute `http(s)` URL is
    /// dropped, which makes an async request fall back to sync.
    pub fn from_raw(
        mode: Option<&str>,
        callback_url: Option<&str>,
        language: Option<&str>,
        content_type: Option<&str>,
    ) -> Self {
        Self {
            requested_mode: ExecutionMode::parse(mode),
            callback_url: callback_url
                .map(str::trim)
                .filter(|url| is_usable_callback_url(url))
                .map(str::to_string),
            language: non_blank(language),
            content_type: non_blank(content_type),
        }
    }

    /// Async only when both the mode and a usable callback URL are present.
    pub fn execution(&self) -> Execution {
        match (self.requested_mode, &self.callback_url) {
            (ExecutionMode::Async, Some(url)) => Execution::Async {
                callback_url: url.clone(),
            },
            _ => Execution::Sync,
        }
    }

    /// Async was asked for but cannot be honoured.
    pub fn is_async_downgraded(&self) -> bool {
        self.requested_mode == ExecutionMode::Async && self.callback_url.is_none()
    }
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parses as an absolute `http` or `https` URL with a non-empty host.
fn is_usable_callback_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
