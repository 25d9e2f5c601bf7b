//! Shell work unit.
//!
//! Runs the script text found in the payload's `data` field with `bash`.
//! The script is written to a uniquely named file under the work directory
//! and removed once the run finishes, whatever the outcome.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::command::{CommandError, CommandInput};
use super::subprocess;
use crate::error::WorkError;
use crate::work_unit::{Payload, Task, WorkUnit};

/// Payload field holding the script text.
pub const SCRIPT_FIELD: &str = "data";

/// Result field holding stdout (exit 0) or stderr (non-zero exit).
pub const RESULT_FIELD: &str = "result";

/// Default wall-clock limit per script run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Executes shell scripts carried in the task payload.
#[derive(Debug, Clone)]
pub struct ShellWorkUnit {
    work_dir: PathBuf,
    timeout: Duration,
    fail_on_nonzero_exit: bool,
}

impl ShellWorkUnit {
    /// Scripts are staged under `work_dir`, which is created on demand.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            timeout: DEFAULT_TIMEOUT,
            fail_on_nonzero_exit: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Treat a non-zero exit as a (retryable) failure instead of returning
    /// stderr as the result.
    pub fn fail_on_nonzero_exit(mut self, fail: bool) -> Self {
        self.fail_on_nonzero_exit = fail;
        self
    }

    async fn run_script(&self, script_path: &Path, task: &Task) -> Result<Payload, WorkError> {
        let mut cmd = tokio::process::Command::new("bash");
        cmd.arg(script_path);

        let input = CommandInput {
            stdin: Value::Object(task.payload.clone()),
            env_vars: vec![],
            working_directory: Some(self.work_dir.clone()),
            timeout: self.timeout,
        };
        let output = subprocess::run_command(&mut cmd, input).await?;

        tracing::debug!(
            script = %script_path.display(),
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            "Shell script finished",
        );

        let text = if output.success() {
            output.stdout
        } else if self.fail_on_nonzero_exit {
            return Err(CommandError::NonZeroExit {
                exit_code: output.exit_code,
                stderr: output.stderr,
            }
            .into());
        } else {
            output.stderr
        };

        let mut result = Payload::new();
        result.insert(RESULT_FIELD.to_string(), Value::String(text));
        Ok(result)
    }
}

#[async_trait]
impl WorkUnit for ShellWorkUnit {
    fn name(&self) -> &str {
        "shell"
    }

    fn validate(&self, task: &Task) -> Result<(), WorkError> {
        task.require_str(SCRIPT_FIELD).map(|_| ())
    }

    async fn execute(&self, task: Task) -> Result<Payload, WorkError> {
        let script = task.require_str(SCRIPT_FIELD)?;

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let script_path = self.work_dir.join(format!("{}.sh", uuid::Uuid::new_v4()));
        tokio::fs::write(&script_path, script).await?;

        let result = self.run_script(&script_path, &task).await;

        if let Err(e) = tokio::fs::remove_file(&script_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    script = %script_path.display(),
                    error = %e,
                    "Failed to remove script file",
                );
            }
        }

        result
    }
}
