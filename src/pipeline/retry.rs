//! Retry with linear backoff for upstream calls

use std::future::Future;
use std::time::Duration;

use log::{info, warn};

use crate::error::{LookupError, Operation};

/// Default number of attempts per operation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay unit between attempts
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Wait after failed attempt `attempt` (1-based): `base_delay * attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Run `call` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
///
/// Exhaustion yields [`LookupError::RetryExhausted`] wrapping the last error.
pub async fn with_retry<T, F, Fut>(
    operation: Operation,
    policy: &RetryPolicy,
    mut call: F,
) -> Result<T, LookupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LookupError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match call().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", operation, attempt);
                }
                return Ok(value);
            }
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) if attempt >= max_attempts => {
                warn!(
                    "{} failed after {} attempts. Last error: {}",
                    operation, attempt, error
                );
                return Err(LookupError::RetryExhausted {
                    operation,
                    attempts: attempt,
                    source: Box::new(error),
                });
            }
            Err(error) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {}ms",
                    operation,
                    attempt,
                    max_attempts,
                    error,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
