//! HTTP front end of the flowlet executor and proxy services.
//!
//! - [`engine`] -- dispatcher, header metadata and the upstream proxy unit.
//! - [`routes`] -- axum handlers.
//! - [`router`] -- router builders with the shared middleware stack.
//! - [`config`] / [`logging`] / [`server`] -- process plumbing for the binaries.

use std::sync::Arc;
use std::time::Duration;

use flowlet_core::retry::{RetryPolicy, Retrying};
use flowlet_core::scripting::shell::ShellWorkUnit;
use flowlet_core::units::{HintRouted, SegmentMultiplier};
use flowlet_core::work_unit::WorkUnit;

pub mod config;
pub mod engine;
pub mod logging;
pub mod response;
pub mod router;
pub mod routes;
pub mod server;
pub mod state;

/// Language hint that routes a request to the shell unit.
pub const SHELL_HINT: &str = "shell";

/// The executor's work unit: shell scripts for `language_type: shell`,
/// the segment multiplier for everything else.
///
/// With more than one shell attempt configured a non-zero exit counts as a
/// failure, so it is retried; otherwise stderr is returned as the result.
pub fn build_executor_unit(config: &config::ExecutorConfig) -> Arc<dyn WorkUnit> {
    let shell = ShellWorkUnit::new(config.work_dir.clone())
        .with_timeout(Duration::from_secs(config.shell_timeout_secs))
        .fail_on_nonzero_exit(config.shell_max_attempts > 1);
    let shell = Retrying::new(shell, RetryPolicy::new(config.shell_max_attempts));

    Arc::new(HintRouted::new(
        SHELL_HINT,
        Arc::new(shell),
        Arc::new(SegmentMultiplier),
    ))
}
