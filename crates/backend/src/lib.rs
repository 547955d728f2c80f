// SPDX-License-Identifier: MIT

//! Authenticated client for the push cloud backend.
//!
//! Three operations: poll (with heartbeat headers), atomic claim, and
//! status update. Transient failures retry with exponential backoff;
//! anything else surfaces to the caller immediately.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod error;
mod retry;
mod types;

pub use client::{BackendClient, DEFAULT_BASE_URL};
pub use error::BackendError;
pub use retry::{backoff_delay, with_retry, MAX_ATTEMPTS, REQUEST_TIMEOUT};
pub use types::{ClaimOutcome, ClaimRequest, PollResponse, StatusUpdate, UpdateResponse};

use async_trait::async_trait;
use push_core::Task;

/// The backend surface the engine depends on. Implemented by
/// [`BackendClient`] over HTTP and by the `FakeBackend` in tests.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Fetch queued tasks for this machine. `repo_urls` rides along as the
    /// heartbeat, the only "I'm alive" signal this daemon emits.
    async fn poll(&self, repo_urls: &[String]) -> Result<Vec<Task>, BackendError>;

    /// Request the atomic queued→running transition for one task.
    async fn claim(&self, display_number: u32) -> Result<ClaimOutcome, BackendError>;

    /// Report a status transition, optionally with a lifecycle event.
    async fn update_status(&self, update: StatusUpdate) -> Result<(), BackendError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBackend;
