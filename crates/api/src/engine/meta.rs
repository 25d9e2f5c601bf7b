//! Dispatch metadata from inbound HTTP headers.

use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use flowlet_core::request::{
    DispatchMeta, CALLBACK_URL_HEADER, LANGUAGE_HINT_HEADER, MODE_HEADER,
};

/// Read mode, callback URL, language hint and content type from `headers`.
pub fn meta_from_headers(headers: &HeaderMap) -> DispatchMeta {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    DispatchMeta::from_raw(
        header(MODE_HEADER),
        header(CALLBACK_URL_HEADER),
        header(LANGUAGE_HINT_HEADER),
        header(CONTENT_TYPE.as_str()),
    )
}
