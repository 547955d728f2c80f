// SPDX-License-Identifier: MIT

//! Retry with exponential backoff for transient backend failures.

use crate::BackendError;
use std::future::Future;
use std::time::Duration;

/// Total attempts per logical request.
pub const MAX_ATTEMPTS: u32 = 3;

/// Per-attempt deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Delay before retry number `failed_attempts` (1-based).
///
/// Schedule: 2 s, 4 s, 8 s, 16 s, then capped at 30 s.
pub fn backoff_delay(failed_attempts: u32) -> Duration {
    let exp = failed_attempts.min(16); // avoid shift overflow; cap dominates anyway
    let delay = Duration::from_secs(1u64 << exp);
    delay.min(BACKOFF_CAP)
}

/// Run `operation` up to [`MAX_ATTEMPTS`] times, sleeping the backoff
/// schedule between attempts. Only retryable errors are retried; any other
/// error returns immediately.
pub async fn with_retry<T, F, Fut>(label: &str, operation: F) -> Result<T, BackendError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    label,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %e,
                    "transient backend failure, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
