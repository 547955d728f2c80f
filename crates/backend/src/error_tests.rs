// SPDX-License-Identifier: MIT

use super::*;
use yare::parameterized;

#[parameterized(
    too_many_requests = { 429 },
    bad_gateway = { 502 },
    unavailable = { 503 },
    gateway_timeout = { 504 },
)]
fn retryable_statuses(status: u16) {
    let err = BackendError::Http { status, body: String::new() };
    assert!(err.is_retryable());
}

#[parameterized(
    bad_request = { 400 },
    not_found = { 404 },
    server_error = { 500 },
)]
fn non_retryable_statuses(status: u16) {
    let err = BackendError::Http { status, body: String::new() };
    assert!(!err.is_retryable());
}

#[parameterized(
    refused = { "tcp connect error: Connection refused (os error 111)" },
    reset = { "connection reset by peer" },
    unreachable = { "Network unreachable" },
    temp_dns = { "temporary failure in name resolution" },
    rate_limited = { "rate limit exceeded" },
    timeout_text = { "operation timeout after 30s" },
)]
fn retryable_network_patterns(message: &str) {
    assert!(BackendError::Network(message.to_string()).is_retryable());
}

#[test]
fn unknown_network_error_is_not_retried() {
    assert!(!BackendError::Network("certificate verify failed".to_string()).is_retryable());
}

#[test]
fn timeout_is_retryable() {
    assert!(BackendError::Timeout.is_retryable());
}

#[test]
fn auth_is_never_retried() {
    let err = BackendError::Auth { status: 401 };
    assert!(!err.is_retryable());
    assert!(err.is_auth());
    assert!(BackendError::MissingApiKey.is_auth());
}

#[test]
fn decode_is_not_retried() {
    assert!(!BackendError::Decode("missing field".to_string()).is_retryable());
}
