//! Pass-through sample unit: scales `segment_item` by ten.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::WorkError;
use crate::work_unit::{Payload, Task, WorkUnit};

pub const SEGMENT_FIELD: &str = "segment_item";
pub const RESULT_FIELD: &str = "executor_result";
pub const TAG_FIELD: &str = "executor_tag";
pub const TAG_VALUE: &str = "executor";

const FACTOR: i64 = 10;

/// Returns `{"executor_result": segment_item * 10, "executor_tag": "executor"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentMultiplier;

#[async_trait]
impl WorkUnit for SegmentMultiplier {
    fn name(&self) -> &str {
        "segment_multiplier"
    }

    fn validate(&self, task: &Task) -> Result<(), WorkError> {
        task.require_i64(SEGMENT_FIELD).map(|_| ())
    }

    async fn execute(&self, task: Task) -> Result<Payload, WorkError> {
        let item = task.require_i64(SEGMENT_FIELD)?;
        let result = item
            .checked_mul(FACTOR)
            .ok_or_else(|| WorkError::Failed(format!("{SEGMENT_FIELD} {item} overflows")))?;

        let mut out = Payload::new();
        out.insert(RESULT_FIELD.to_string(), Value::from(result));
        out.insert(TAG_FIELD.to_string(), Value::from(TAG_VALUE));
        Ok(out)
    }
}
