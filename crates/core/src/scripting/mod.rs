//! Subprocess-backed work units.
//!
//! [`subprocess::run_command`] owns spawning, stdin/stdout plumbing and the
//! per-run timeout; [`shell::ShellWorkUnit`] builds on it to run a shell
//! script supplied in the task payload. Wrap either in
//! [`Retrying`](crate::retry::Retrying) to get a bounded retry loop.

pub mod command;
pub mod shell;
pub mod subprocess;

/// Shared test helpers for subprocess tests.
#[cfg(test)]
pub(crate) mod test_helpers {
    use std::time::Duration;

    use super::command::CommandInput;

    /// Build a default [`CommandInput`] for tests.
    ///
    /// Pipes `{"key": "value"}` to stdin, sets no env vars or working
    /// directory, and allows 5 seconds.
    pub fn default_input() -> CommandInput {
        CommandInput {
            stdin: serde_json::json!({"key": "value"}),
            env_vars: vec![],
            working_directory: None,
            timeout: Duration::from_secs(5),
        }
    }
}
