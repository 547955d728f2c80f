// SPDX-License-Identifier: MIT

//! Scripted in-memory backend for engine and scheduler tests.

use crate::{Backend, BackendError, ClaimOutcome, StatusUpdate};
use async_trait::async_trait;
use parking_lot::Mutex;
use push_core::Task;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Default)]
struct FakeBackendState {
    /// Successive poll results; exhausted → empty list
    poll_queue: VecDeque<Vec<Task>>,
    /// Display numbers whose claim is denied, with the winning machine
    claim_denials: HashMap<u32, String>,
    /// Every recorded interaction, in order
    polls: u32,
    claims: Vec<u32>,
    updates: Vec<StatusUpdate>,
    /// Heartbeat repo URLs seen on the most recent poll
    last_heartbeat: Vec<String>,
    fail_next_poll: bool,
}

/// A [`Backend`] whose responses are scripted by the test.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<FakeBackendState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one poll result.
    pub fn push_poll(&self, tasks: Vec<Task>) {
        self.inner.lock().poll_queue.push_back(tasks);
    }

    /// Deny claims for a display number, as if `winner` got there first.
    pub fn deny_claim(&self, display_number: u32, winner: &str) {
        self.inner.lock().claim_denials.insert(display_number, winner.to_string());
    }

    /// Make the next poll fail with a transient error.
    pub fn fail_next_poll(&self) {
        self.inner.lock().fail_next_poll = true;
    }

    pub fn poll_count(&self) -> u32 {
        self.inner.lock().polls
    }

    pub fn claims(&self) -> Vec<u32> {
        self.inner.lock().claims.clone()
    }

    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.inner.lock().updates.clone()
    }

    pub fn last_heartbeat(&self) -> Vec<String> {
        self.inner.lock().last_heartbeat.clone()
    }

    /// Updates recorded for one task, in write order.
    pub fn updates_for(&self, display_number: u32) -> Vec<StatusUpdate> {
        self.inner
            .lock()
            .updates
            .iter()
            .filter(|u| u.display_number == display_number)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn poll(&self, repo_urls: &[String]) -> Result<Vec<Task>, BackendError> {
        let mut state = self.inner.lock();
        state.polls += 1;
        state.last_heartbeat = repo_urls.to_vec();
        if state.fail_next_poll {
            state.fail_next_poll = false;
            return Err(BackendError::Timeout);
        }
        Ok(state.poll_queue.pop_front().unwrap_or_default())
    }

    async fn claim(&self, display_number: u32) -> Result<ClaimOutcome, BackendError> {
        let mut state = self.inner.lock();
        state.claims.push(display_number);
        match state.claim_denials.get(&display_number) {
            Some(winner) => {
                Ok(ClaimOutcome { claimed: false, claimed_by: Some(winner.clone()) })
            }
            None => Ok(ClaimOutcome { claimed: true, claimed_by: None }),
        }
    }

    async fn update_status(&self, update: StatusUpdate) -> Result<(), BackendError> {
        self.inner.lock().updates.push(update);
        Ok(())
    }
}
