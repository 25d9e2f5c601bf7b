//! Callback delivery for async task results.
//!
//! [`HttpCallbackNotifier`] POSTs a JSON-encoded [`ResultEnvelope`] to the
//! URL the orchestrator supplied. Each call makes exactly one attempt.
//! Failures are logged with the URL and body and returned to the caller,
//! who normally drops them.

use std::time::Duration;

use async_trait::async_trait;
use flowlet_core::envelope::ResultEnvelope;

/// Default timeout for a single callback POST.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for callback delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The callback receiver returned a non-2xx status code.
    #[error("Callback returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// CallbackNotifier
// ---------------------------------------------------------------------------

/// Delivers a finished task's envelope to the caller.
#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    /// Make one delivery attempt of `envelope` to `url`.
    async fn deliver(&self, url: &str, envelope: &ResultEnvelope) -> Result<(), CallbackError>;
}

// ---------------------------------------------------------------------------
// HttpCallbackNotifier
// ---------------------------------------------------------------------------

/// Posts envelopes as `application/json`.
#[derive(Debug, Clone)]
pub struct HttpCallbackNotifier {
    client: reqwest::Client,
}

impl HttpCallbackNotifier {
    /// Build a notifier whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, CallbackError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn try_send(&self, url: &str, body: &serde_json::Value) -> Result<u16, CallbackError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::HttpStatus(status.as_u16()));
        }
        Ok(status.as_u16())
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn deliver(&self, url: &str, envelope: &ResultEnvelope) -> Result<(), CallbackError> {
        let body = envelope.clone().into_value();

        match self.try_send(url, &body).await {
            Ok(status) => {
                tracing::info!(
                    url,
                    status,
                    result_type = envelope.result_type().as_str(),
                    "Callback delivered",
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    url,
                    body = %body,
                    error = %e,
                    "Callback delivery failed",
                );
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
