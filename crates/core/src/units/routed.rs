//! Route a task to one of two units by its language hint.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WorkError;
use crate::work_unit::{Payload, Task, WorkUnit};

/// Sends tasks whose `language` hint equals `hint` to `hinted`, everything
/// else to `default`.
pub struct HintRouted {
    hint: String,
    hinted: Arc<dyn WorkUnit>,
    default: Arc<dyn WorkUnit>,
}

impl HintRouted {
    pub fn new(
        hint: impl Into<String>,
        hinted: Arc<dyn WorkUnit>,
        default: Arc<dyn WorkUnit>,
    ) -> Self {
        Self {
            hint: hint.into(),
            hinted,
            default,
        }
    }

    fn select(&self, task: &Task) -> &dyn WorkUnit {
        match task.language.as_deref() {
            Some(language) if language.eq_ignore_ascii_case(&self.hint) => self.hinted.as_ref(),
            _ => self.default.as_ref(),
        }
    }
}

#[async_trait]
impl WorkUnit for HintRouted {
    fn name(&self) -> &str {
        "hint_routed"
    }

    fn validate(&self, task: &Task) -> Result<(), WorkError> {
        if task.payload.is_empty() {
            return Err(WorkError::Validation("request body is empty".into()));
        }
        self.select(task).validate(task)
    }

    async fn execute(&self, task: Task) -> Result<Payload, WorkError> {
        let unit = self.select(&task);
        tracing::debug!(unit = unit.name(), "Routing task");
        unit.execute(task).await
    }
}
