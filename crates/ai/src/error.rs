//! Error types for content generation and fit evaluation.

use std::time::Duration;
use thiserror::Error;

/// Error reported by the provider API itself (non-2xx answer with a body).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("provider error {code} {status}: {message}")]
pub struct ApiError {
    /// HTTP status code
    pub code: u16,
    /// Provider status string, e.g. `RESOURCE_EXHAUSTED`
    pub status: String,
    pub message: String,
    /// How long the provider asked us to wait before retrying
    pub retry_delay: Option<Duration>,
}

impl ApiError {
    pub fn new(code: u16, status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            status: status.into(),
            message: message.into(),
            retry_delay: None,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Request timeout, any 5xx, or an explicit `UNAVAILABLE` status.
    pub fn is_retryable_status(&self) -> bool {
        self.code == 408
            || (500..600).contains(&self.code)
            || self.status.eq_ignore_ascii_case("UNAVAILABLE")
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation cancelled")]
    Cancelled,

    #[error("generation deadline exceeded")]
    DeadlineExceeded,

    #[error("request to provider timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("provider asked to wait {delay:?}, longer than the allowed {limit:?}")]
    QuotaDelayTooLong { delay: Duration, limit: Duration },

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<GenerateError>,
    },
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("cannot parse provider response: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize {what} for the prompt: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
