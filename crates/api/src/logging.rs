//! Tracing setup and request logging helpers.

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Stable tag attached to every processing failure log line.
pub const FAILURE_TAG: &str = "executor_processing_failed";

/// Placeholder logged instead of a sensitive header value.
pub const REDACTED: &str = "[REDACTED]";

/// Headers whose values never reach the logs.
const SENSITIVE_HEADERS: [&str; 6] = [
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
];

/// Longest request body prefix written to the logs.
const MAX_LOGGED_BODY: usize = 4096;

const DEFAULT_FILTER: &str =
    "flowlet_api=debug,flowlet_core=info,flowlet_worker=info,flowlet_events=info,tower_http=info";

/// Output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON; anything else is text.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Header map as a JSON object with sensitive values replaced.
pub fn redacted_headers(headers: &HeaderMap) -> Value {
    let mut out = Map::new();
    for (name, value) in headers {
        let key = name.as_str();
        let shown = if SENSITIVE_HEADERS.contains(&key) {
            REDACTED.to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        };
        out.insert(key.to_string(), Value::String(shown));
    }
    Value::Object(out)
}

/// Lossy UTF-8 rendering of a request body, cut at [`MAX_LOGGED_BODY`]
/// bytes.
pub fn body_preview(body: &[u8]) -> String {
    if body.len() <= MAX_LOGGED_BODY {
        return String::from_utf8_lossy(body).into_owned();
    }
    let mut shown = String::from_utf8_lossy(&body[..MAX_LOGGED_BODY]).into_owned();
    shown.push_str(&format!("... ({} bytes total)", body.len()));
    shown
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn sensitive_headers_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret"));
        headers.insert("X-Api-Key", HeaderValue::from_static("k"));
        headers.insert("cookie", HeaderValue::from_static("session=1"));
        headers.insert("x-mode", HeaderValue::from_static("async"));

        let logged = redacted_headers(&headers);

        assert_eq!(logged["authorization"], REDACTED);
        assert_eq!(logged["x-api-key"], REDACTED);
        assert_eq!(logged["cookie"], REDACTED);
        assert_eq!(logged["x-mode"], "async");
        assert!(!logged.to_string().contains("secret"));
    }

    #[test]
    fn body_preview_shows_small_bodies_verbatim() {
        assert_eq!(body_preview(br#"{"prompt":"hi"}"#), r#"{"prompt":"hi"}"#);
        assert_eq!(body_preview(b"just text"), "just text");
        assert_eq!(body_preview(b""), "");
    }

    #[test]
    fn body_preview_truncates_large_bodies() {
        let body = vec![b'a'; MAX_LOGGED_BODY + 10];
        let shown = body_preview(&body);
        assert!(shown.starts_with(&"a".repeat(MAX_LOGGED_BODY)));
        assert!(shown.ends_with(&format!("({} bytes total)", MAX_LOGGED_BODY + 10)));
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
    }
}
