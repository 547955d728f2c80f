// SPDX-License-Identifier: MIT

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[test]
fn backoff_schedule_is_2_4_8_16_capped_30() {
    let delays: Vec<u64> = (1..=6).map(|n| backoff_delay(n).as_secs()).collect();
    assert_eq!(delays, vec![2, 4, 8, 16, 30, 30]);
}

#[test]
fn backoff_never_exceeds_cap_for_large_attempts() {
    assert_eq!(backoff_delay(1000).as_secs(), 30);
}

#[tokio::test(start_paused = true)]
async fn retries_transient_errors_then_succeeds() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);

    let result = with_retry("poll", move || {
        let calls = Arc::clone(&calls2);
        async move {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(BackendError::Timeout),
                _ => Ok(42),
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);

    let result: Result<(), _> = with_retry("poll", move || {
        let calls = Arc::clone(&calls2);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Http { status: 503, body: String::new() })
        }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
}

#[tokio::test]
async fn non_retryable_error_fails_fast() {
    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);

    let result: Result<(), _> = with_retry("claim", move || {
        let calls = Arc::clone(&calls2);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Auth { status: 401 })
        }
    })
    .await;

    assert!(matches!(result, Err(BackendError::Auth { status: 401 })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn sleeps_follow_the_schedule() {
    // With tokio's paused clock, sleeps complete instantly but still
    // advance virtual time; total elapsed must equal 2s + 4s.
    let start = tokio::time::Instant::now();
    let calls = Arc::new(AtomicU32::new(0));
    let calls2 = Arc::clone(&calls);

    let _ = with_retry("poll", move || {
        let calls = Arc::clone(&calls2);
        async move {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(BackendError::Timeout),
                _ => Ok(()),
            }
        }
    })
    .await;

    assert_eq!(start.elapsed(), Duration::from_secs(6));
}
