// src/error_recovery.rs
//! Retry with exponential backoff for Notion writes.

use crate::error::PersistenceError;
use std::time::Duration;

/// Backoff schedule for one retried operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        std::cmp::min(self.initial_delay.saturating_mul(factor), self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        use crate::constants::{
            WRITE_INITIAL_BACKOFF_MS, WRITE_MAX_ATTEMPTS, WRITE_MAX_BACKOFF_MS,
        };
        Self {
            max_attempts: WRITE_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(WRITE_INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(WRITE_MAX_BACKOFF_MS),
        }
    }
}

/// Retries an async operation with exponential backoff.
///
/// Only errors classified as retryable are retried; anything else is
/// returned on the spot.
pub async fn retry_with_backoff<F, T, Fut>(
    operation: F,
    policy: RetryPolicy,
) -> Result<T, PersistenceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, PersistenceError>>,
{
    retry_with_backoff_if(operation, policy, PersistenceError::is_retryable).await
}

/// Like [`retry_with_backoff`], retrying only errors `should_retry` accepts.
pub async fn retry_with_backoff_if<F, T, Fut, P>(
    mut operation: F,
    policy: RetryPolicy,
    should_retry: P,
) -> Result<T, PersistenceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, PersistenceError>>,
    P: Fn(&PersistenceError) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && should_retry(&e) => {
                let delay = policy.delay_after(attempt);
                log::warn!(
                    "Attempt {} failed ({}), retrying after {:?}",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
