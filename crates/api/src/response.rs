//! HTTP rendering of dispatch outcomes.
//!
//! Every outcome is answered with `200 OK`; success and failure are told
//! apart by the body's `result_type`, never by the status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::engine::Dispatched;

impl IntoResponse for Dispatched {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.into_body())).into_response()
    }
}
