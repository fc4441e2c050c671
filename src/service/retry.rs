use log::warn;
use std::future::Future;
use std::time::Duration;

use crate::error::{GenError, Result};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    #[cfg(test)]
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[cfg(test)]
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_backoff_if(policy, op, |_| true).await
}

/// Runs `op` until it succeeds or the policy's attempts are used up. Errors
/// rejected by `should_retry` come back as-is without further attempts.
pub async fn retry_with_backoff_if<T, F, Fut, P>(
    policy: &RetryPolicy,
    mut op: F,
    should_retry: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&GenError) -> bool,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        // Nothing was retried, so there is nothing to report as exhausted
        if !should_retry(&err) || attempts == 1 {
            return Err(err);
        }

        if attempt + 1 >= attempts {
            return Err(GenError::RetriesExhausted {
                attempts,
                source: Box::new(err),
            });
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "Attempt {}/{} failed: {}; retrying in {:?}",
            attempt + 1,
            attempts,
            err,
            delay
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
