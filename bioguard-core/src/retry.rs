use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

use crate::platform::PlatformError;

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Bounded exponential backoff for rate-limited platform calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Backoff before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `call` until it succeeds, fails with a non-transient error, or
    /// `max_attempts` is used up.
    ///
    /// A platform-supplied retry-after wins over a shorter backoff.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, PlatformError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        let mut attempt = 1;

        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(err);
            }

            if attempt >= self.max_attempts {
                error!(operation, attempts = attempt, %err, "giving up after retries");
                return Err(err);
            }

            let wait = match &err {
                PlatformError::RateLimited { retry_after } => {
                    (*retry_after).max(self.backoff(attempt))
                }
                _ => self.backoff(attempt),
            };

            warn!(operation, attempt, ?wait, %err, "transient platform error; retrying");
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}
