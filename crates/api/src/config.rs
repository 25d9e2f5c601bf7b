//! Service configuration loaded from environment variables.
//!
//! Both binaries share [`ServerConfig`]; the executor adds [`ExecutorConfig`]
//! and the proxy adds [`ProxyConfig`]. Every loader has a `from_lookup`
//! form so tests can supply variables without touching the process
//! environment.

use std::path::PathBuf;

use flowlet_events::DEFAULT_CALLBACK_TIMEOUT;

/// Configuration problems that stop a service from starting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent or blank.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is present but unusable.
    #[error("{var} is invalid ({value:?}): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Per-binary defaults that differ between the executor and the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDefaults {
    pub port: u16,
    pub worker_pool_size: usize,
}

/// Defaults for `flowlet-executor`.
pub const EXECUTOR_DEFAULTS: ServiceDefaults = ServiceDefaults {
    port: 8000,
    worker_pool_size: 8,
};

/// Defaults for `flowlet-proxy`.
pub const PROXY_DEFAULTS: ServiceDefaults = ServiceDefaults {
    port: 8002,
    worker_pool_size: 40,
};

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// HTTP server and dispatch settings shared by both services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000` executor, `8002` proxy).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `300`).
    pub request_timeout_secs: u64,
    /// Time allowed for the worker pool to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Number of pool workers (default: `8` executor, `40` proxy).
    pub worker_pool_size: usize,
    /// Timeout for one callback POST in seconds (default: `10`).
    pub callback_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | per service             |
    /// | `REQUEST_TIMEOUT_SECS`  | `300`                   |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `WORKER_POOL_SIZE`      | per service             |
    /// | `CALLBACK_TIMEOUT_SECS` | `10`                    |
    pub fn from_env(defaults: ServiceDefaults) -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup, defaults)
    }

    pub fn from_lookup(
        lookup: &dyn Fn(&str) -> Option<String>,
        defaults: ServiceDefaults,
    ) -> Result<Self, ConfigError> {
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| "0.0.0.0".into());

        let worker_pool_size = parse_or(lookup, "WORKER_POOL_SIZE", defaults.worker_pool_size)?;
        if worker_pool_size == 0 {
            return Err(ConfigError::Invalid {
                var: "WORKER_POOL_SIZE",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            host,
            port: parse_or(lookup, "PORT", defaults.port)?,
            request_timeout_secs: parse_or(lookup, "REQUEST_TIMEOUT_SECS", 300)?,
            shutdown_timeout_secs: parse_or(lookup, "SHUTDOWN_TIMEOUT_SECS", 30)?,
            worker_pool_size,
            callback_timeout_secs: parse_or(
                lookup,
                "CALLBACK_TIMEOUT_SECS",
                DEFAULT_CALLBACK_TIMEOUT.as_secs(),
            )?,
        })
    }
}

// ---------------------------------------------------------------------------
// ExecutorConfig
// ---------------------------------------------------------------------------

/// Settings for `flowlet-executor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub server: ServerConfig,
    /// Directory where shell scripts are staged (default: system temp dir).
    pub work_dir: PathBuf,
    /// Attempts per shell task (default: `1`, i.e. no retry).
    pub shell_max_attempts: u32,
    /// Wall-clock limit per shell run in seconds (default: `600`).
    pub shell_timeout_secs: u64,
}

impl ExecutorConfig {
    /// | Env Var              | Default          |
    /// |----------------------|------------------|
    /// | `WORK_DIR`           | system temp dir  |
    /// | `SHELL_MAX_ATTEMPTS` | `1`              |
    /// | `SHELL_TIMEOUT_SECS` | `600`            |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server = ServerConfig::from_lookup(lookup, EXECUTOR_DEFAULTS)?;

        let work_dir = lookup("WORK_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let shell_max_attempts: u32 = parse_or(lookup, "SHELL_MAX_ATTEMPTS", 1)?;
        if shell_max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "SHELL_MAX_ATTEMPTS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            server,
            work_dir,
            shell_max_attempts,
            shell_timeout_secs: parse_or(lookup, "SHELL_TIMEOUT_SECS", 600)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ProxyConfig
// ---------------------------------------------------------------------------

/// Settings for `flowlet-proxy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub server: ServerConfig,
    /// Base URL requests are forwarded to, without a trailing slash.
    pub upstream_url: String,
    /// Timeout for one upstream request in seconds (default: `300`).
    pub upstream_timeout_secs: u64,
}

impl ProxyConfig {
    /// | Env Var                          | Default    |
    /// |----------------------------------|------------|
    /// | `UPSTREAM_URL` (or `upstream_url`) | required |
    /// | `UPSTREAM_TIMEOUT_SECS`          | `300`      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server = ServerConfig::from_lookup(lookup, PROXY_DEFAULTS)?;

        let raw = lookup("UPSTREAM_URL")
            .or_else(|| lookup("upstream_url"))
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::Missing("UPSTREAM_URL"))?;

        let parsed = reqwest::Url::parse(&raw).map_err(|e| ConfigError::Invalid {
            var: "UPSTREAM_URL",
            value: raw.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: "UPSTREAM_URL",
                value: raw,
                reason: "scheme must be http or https".into(),
            });
        }

        Ok(Self {
            server,
            upstream_url: raw.trim_end_matches('/').to_string(),
            upstream_timeout_secs: parse_or(lookup, "UPSTREAM_TIMEOUT_SECS", 300)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_or<T>(
    lookup: &dyn Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
