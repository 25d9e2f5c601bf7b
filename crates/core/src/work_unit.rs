//! The pluggable work function behind every executor endpoint.
//!
//! A [`WorkUnit`] turns a [`Task`] into a result [`Payload`] or a
//! [`WorkError`]. It knows nothing about HTTP, execution modes or callbacks;
//! the dispatcher decides where and when it runs.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WorkError;
use crate::request::DispatchMeta;

/// Schema-less JSON object exchanged with work units.
pub type Payload = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// One unit of work: the request payload plus the hints a unit may use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    pub payload: Payload,
    /// Language hint (`language_type` header), e.g. `shell`.
    pub language: Option<String>,
    /// Content type of the original request body.
    pub content_type: Option<String>,
}

impl Task {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    /// Build a task carrying the hints from the request metadata.
    pub fn from_meta(payload: Payload, meta: &DispatchMeta) -> Self {
        Self {
            payload,
            language: meta.language.clone(),
            content_type: meta.content_type.clone(),
        }
    }

    /// Required integer field.
    pub fn require_i64(&self, key: &str) -> Result<i64, WorkError> {
        match self.payload.get(key) {
            Some(value) => value
                .as_i64()
                .ok_or_else(|| WorkError::Validation(format!("{key} must be an integer"))),
            None => Err(WorkError::Validation(format!("{key} is required"))),
        }
    }

    /// Required string field.
    pub fn require_str(&self, key: &str) -> Result<&str, WorkError> {
        match self.payload.get(key) {
            Some(value) => value
                .as_str()
                .ok_or_else(|| WorkError::Validation(format!("{key} must be a string"))),
            None => Err(WorkError::Validation(format!("{key} is required"))),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkUnit
// ---------------------------------------------------------------------------

/// A pluggable task implementation.
///
/// `validate` runs on the request path before anything is scheduled; a
/// failure there is answered synchronously and the unit never executes.
#[async_trait]
pub trait WorkUnit: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Reject tasks that can never succeed. By default an empty payload is
    /// rejected.
    fn validate(&self, task: &Task) -> Result<(), WorkError> {
        if task.payload.is_empty() {
            return Err(WorkError::Validation("request body is empty".into()));
        }
        Ok(())
    }

    /// Do the work.
    async fn execute(&self, task: Task) -> Result<Payload, WorkError>;
}

#[async_trait]
impl<U: WorkUnit + ?Sized> WorkUnit for Arc<U> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn validate(&self, task: &Task) -> Result<(), WorkError> {
        (**self).validate(task)
    }

    async fn execute(&self, task: Task) -> Result<Payload, WorkError> {
        (**self).execute(task).await
    }
}

/// Parse a request body into a payload.
///
/// An empty body yields an empty payload (left for `validate` to reject).
/// Invalid JSON and non-object JSON are validation errors.
pub fn parse_payload(body: &[u8]) -> Result<Payload, WorkError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(WorkError::Validation(
            "request body must be a JSON object".into(),
        )),
        Err(e) => Err(WorkError::Validation(format!("request body is not JSON: {e}"))),
    }
}
