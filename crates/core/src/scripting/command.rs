//! Input, output and error types for subprocess runs.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

/// What a subprocess receives.
#[derive(Debug, Clone)]
pub struct CommandInput {
    /// JSON written to the child's stdin before it is closed.
    pub stdin: Value,
    /// Extra environment variables for the child.
    pub env_vars: Vec<(String, String)>,
    /// Working directory (inherits the current one if `None`).
    pub working_directory: Option<PathBuf>,
    /// Wall-clock limit; the child is killed when it expires.
    pub timeout: Duration,
}

/// What a finished subprocess produced.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `-1` when the child was killed by a signal.
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors from spawning or supervising a subprocess.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The child could not be spawned or awaited.
    #[error("Failed to run command: {0}")]
    Spawn(#[from] std::io::Error),

    /// The child outlived its timeout and was killed.
    #[error("Command timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The child exited non-zero and the caller treats that as failure.
    #[error("Command failed with exit code {exit_code}: {stderr}")]
    NonZeroExit { exit_code: i32, stderr: String },
}
