// SPDX-License-Identifier: MIT

//! Backend error taxonomy and the closed retryable set.

use thiserror::Error;

/// HTTP statuses that always count as transient.
const RETRYABLE_STATUSES: [u16; 4] = [429, 502, 503, 504];

/// Failure substrings that count as transient. This set is closed on
/// purpose: an unknown failure is surfaced, not silently retried.
const RETRYABLE_PATTERNS: [&str; 6] = [
    "timeout",
    "connection refused",
    "connection reset",
    "network unreachable",
    "temporary failure",
    "rate limit",
];

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no API key configured, run `push connect`")]
    MissingApiKey,

    #[error("authentication rejected (HTTP {status})")]
    Auth { status: u16 },

    #[error("backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether a retry with backoff is warranted.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Http { status, .. } => RETRYABLE_STATUSES.contains(status),
            Self::Network(message) => {
                let message = message.to_ascii_lowercase();
                RETRYABLE_PATTERNS.iter().any(|p| message.contains(p))
            }
            Self::MissingApiKey | Self::Auth { .. } | Self::Decode(_) => false,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::MissingApiKey)
    }

    /// Collapse a reqwest error into our taxonomy, flattening the source
    /// chain so pattern matching sees the underlying io error text.
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Network(message)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
