//! Retry wrapper with per-attempt timeouts.
//!
//! Wraps any `ChatModel` and retries transient failures (rate limits,
//! timeouts, network drops, 5xx) with exponential backoff. Permanent
//! failures (bad key, malformed payload, 4xx) surface immediately.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::error::LlmError;
use switchboard_core::llm::{ChatCompletion, ChatModel, ChatRequest};
use tracing::{info, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// A model that retries a wrapped model on transient failure.
pub struct RetryingModel {
    inner: Arc<dyn ChatModel>,
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    call_timeout: Duration,
}

impl RetryingModel {
    pub fn new(inner: Arc<dyn ChatModel>) -> Self {
        Self {
            inner,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Total attempts including the first. Clamped to at least 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Upper bound on a single attempt, independent of the HTTP client's
    /// own timeout.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Delay before the attempt after `attempt`: base * 2^(attempt-1),
    /// capped at `max_delay`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exp).min(self.max_delay)
    }
}

#[async_trait]
impl ChatModel for RetryingModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, LlmError> {
        let mut last_error = LlmError::Network("no attempts were made".into());

        for attempt in 1..=self.max_attempts {
            match tokio::time::timeout(self.call_timeout, self.inner.complete(request.clone()))
                .await
            {
                Ok(Ok(response)) => {
                    if attempt > 1 {
                        info!(attempt, "Model call recovered");
                    }
                    return Ok(response);
                }
                Ok(Err(e)) => {
                    if !e.is_retryable() {
                        warn!(error = %e, "Model call failed permanently");
                        return Err(e);
                    }
                    warn!(attempt, max = self.max_attempts, error = %e, "Model call failed");
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        attempt,
                        timeout_secs = self.call_timeout.as_secs(),
                        "Model call timed out"
                    );
                    last_error = LlmError::Timeout(format!(
                        "no response within {}s",
                        self.call_timeout.as_secs()
                    ));
                }
            }

            if attempt < self.max_attempts {
                // A server-provided Retry-After wins over the computed
                // backoff, still capped at max_delay
                let delay = match &last_error {
                    LlmError::RateLimited { retry_after_secs } if *retry_after_secs > 0 => {
                        Duration::from_secs(*retry_after_secs).min(self.max_delay)
                    }
                    _ => self.backoff_delay(attempt),
                };
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error)
    }
}
