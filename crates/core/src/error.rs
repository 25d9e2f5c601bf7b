use crate::scripting::command::CommandError;

/// Failure raised by a work unit or by the request shaping in front of it.
///
/// None of these messages ever reach the caller; the dispatcher logs them
/// and answers with the fixed failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    /// The request payload is missing, empty, or lacks a required field.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The work unit ran and reported a domain failure.
    #[error("Work unit failed: {0}")]
    Failed(String),

    /// A subprocess-backed unit could not run its command.
    #[error(transparent)]
    Script(#[from] CommandError),

    /// Filesystem or other local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The forwarded upstream call failed (proxy variant).
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    /// The work unit panicked; the message is the panic payload.
    #[error("Work unit panicked: {0}")]
    Panicked(String),
}

impl WorkError {
    /// Whether a fresh attempt of the same task could succeed.
    ///
    /// Validation failures are deterministic and never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }

    /// Short, stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Failed(_) => "failed",
            Self::Script(_) => "script",
            Self::Io(_) => "io",
            Self::Upstream(_) => "upstream",
            Self::Panicked(_) => "panicked",
        }
    }
}
