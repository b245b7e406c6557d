//! Retry state machine around a single [`Transport`].
//!
//! ## Algorithm
//! Each logical request moves through `Attempting -> {Success, Retrying, Failed}`.
//! After a failed attempt the error is classified:
//!
//! 1. cancellation or deadline: fail, never retry
//! 2. network timeout: exponential backoff
//! 3. provider error with a retry-delay hint: wait for the hint plus a
//!    margin, or fail with [`GenerateError::QuotaDelayTooLong`] when the hint
//!    is above the quota ceiling
//! 4. provider error with a retryable status (408, 5xx, `UNAVAILABLE`):
//!    exponential backoff
//! 5. anything else: fail
//!
//! A retryable failure on the last permitted attempt ends in
//! [`GenerateError::RetriesExhausted`].
//!
//! Waiting is a plain `tokio::time::sleep`, so dropping the future cancels
//! the request at any point. With a deadline set, every attempt is bounded by
//! it and a wait that would end past it fails immediately.

use crate::error::GenerateError;
use crate::generator::{Generator, ModelInfo, Transport};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_QUOTA_DELAY: Duration = Duration::from_secs(30);
pub const QUOTA_DELAY_MARGIN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Longest provider-hinted wait we are willing to sit through
    pub max_quota_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            max_quota_delay: DEFAULT_MAX_QUOTA_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Set the attempt budget; zero or negative falls back to the default.
    pub fn with_max_attempts(mut self, attempts: i64) -> Self {
        self.max_attempts = u32::try_from(attempts)
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        self
    }

    pub fn with_max_quota_delay(mut self, delay: Duration) -> Self {
        self.max_quota_delay = delay;
        self
    }

    /// Backoff after the `attempt`-th failure (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Fatal,
    Backoff,
    Wait(Duration),
    QuotaTooLong(Duration),
}

/// [`Generator`] that retries a [`Transport`] according to a [`RetryPolicy`].
pub struct RetryingGenerator<T> {
    transport: T,
    policy: RetryPolicy,
    deadline: Option<Instant>,
}

impl<T: Transport> RetryingGenerator<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            deadline: None,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound every request made through this generator by `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn classify(&self, err: &GenerateError) -> Decision {
        match err {
            GenerateError::Cancelled | GenerateError::DeadlineExceeded => Decision::Fatal,
            GenerateError::Timeout => Decision::Backoff,
            GenerateError::Api(api) => match api.retry_delay {
                Some(delay) if delay > self.policy.max_quota_delay => Decision::QuotaTooLong(delay),
                Some(delay) => Decision::Wait(delay.saturating_add(QUOTA_DELAY_MARGIN)),
                None if api.is_retryable_status() => Decision::Backoff,
                None => Decision::Fatal,
            },
            _ => Decision::Fatal,
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<String, GenerateError> {
        let sent = match self.deadline {
            Some(deadline) => timeout_at(deadline, self.transport.send(prompt))
                .await
                .map_err(|_| GenerateError::DeadlineExceeded)?,
            None => self.transport.send(prompt).await,
        };

        sent?.text().ok_or(GenerateError::EmptyResponse)
    }
}

#[async_trait]
impl<T: Transport> Generator for RetryingGenerator<T> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let err = match self.attempt(prompt).await {
                Ok(text) => {
                    debug!(attempt, "generation succeeded");
                    return Ok(text);
                }
                Err(err) => err,
            };

            let delay = match self.classify(&err) {
                Decision::Fatal => return Err(err),
                Decision::QuotaTooLong(delay) => {
                    warn!(
                        delay_secs = delay.as_secs_f64(),
                        limit_secs = self.policy.max_quota_delay.as_secs_f64(),
                        "provider quota delay is too long, not retrying"
                    );
                    return Err(GenerateError::QuotaDelayTooLong {
                        delay,
                        limit: self.policy.max_quota_delay,
                    });
                }
                Decision::Backoff => self.policy.backoff(attempt),
                Decision::Wait(delay) => delay,
            };

            if attempt >= max_attempts {
                return Err(GenerateError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            if let Some(deadline) = self.deadline {
                if Instant::now() + delay >= deadline {
                    return Err(GenerateError::DeadlineExceeded);
                }
            }

            warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "generation failed, retrying"
            );
            sleep(delay).await;
        }
    }

    fn model_info(&self) -> Option<&dyn ModelInfo> {
        self.transport.model_info()
    }
}
