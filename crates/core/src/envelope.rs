//! Uniform result envelope returned to the orchestrator.
//!
//! Every response and callback body is a JSON object carrying a
//! `result_type` field. A success envelope is the work unit's payload with
//! `result_type = "SUCCESS"` merged in; a failure envelope carries only
//! `result_type = "FAILED"` and a fixed `error_msg`.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::work_unit::Payload;

/// Key holding the `SUCCESS` / `FAILED` marker.
pub const RESULT_TYPE_KEY: &str = "result_type";

/// Key holding the human-readable failure message.
pub const ERROR_MSG_KEY: &str = "error_msg";

/// The only failure message ever returned to callers.
pub const PROCESSING_FAILED_MSG: &str = "Executor processing failed";

// ---------------------------------------------------------------------------
// ResultType
// ---------------------------------------------------------------------------

/// Outcome marker carried in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    Success,
    Failed,
}

impl ResultType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

// ---------------------------------------------------------------------------
// ResultEnvelope
// ---------------------------------------------------------------------------

/// Success payload or failure message, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEnvelope {
    /// The work unit's output. Serialized with `result_type` merged in.
    Success(Payload),
    /// A failure with a caller-safe message.
    Failed { error_msg: String },
}

impl ResultEnvelope {
    pub fn success(payload: Payload) -> Self {
        Self::Success(payload)
    }

    /// The bare `{"result_type":"SUCCESS"}` acknowledgement of an async task.
    pub fn accepted() -> Self {
        Self::Success(Payload::new())
    }

    pub fn failed(error_msg: impl Into<String>) -> Self {
        Self::Failed {
            error_msg: error_msg.into(),
        }
    }

    /// The fixed failure envelope used for every per-request error.
    pub fn processing_failed() -> Self {
        Self::failed(PROCESSING_FAILED_MSG)
    }

    pub fn result_type(&self) -> ResultType {
        match self {
            Self::Success(_) => ResultType::Success,
            Self::Failed { .. } => ResultType::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result_type() == ResultType::Success
    }

    /// Flatten into the wire object.
    ///
    /// A `result_type` key already present in a success payload is
    /// overwritten.
    pub fn into_value(self) -> Value {
        let result_type = self.result_type();
        let mut map = match self {
            Self::Success(payload) => payload,
            Self::Failed { error_msg } => {
                let mut map = Payload::new();
                map.insert(ERROR_MSG_KEY.to_string(), Value::String(error_msg));
                map
            }
        };
        map.insert(
            RESULT_TYPE_KEY.to_string(),
            Value::String(result_type.as_str().to_string()),
        );
        Value::Object(map)
    }
}

impl Serialize for ResultEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.clone().into_value().serialize(serializer)
    }
}
