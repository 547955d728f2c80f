// SPDX-License-Identifier: MIT

//! Wire shapes for the three backend operations.

use push_core::{ExecutionStatus, LifecycleEvent, Task};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollResponse {
    #[serde(default)]
    pub todos: Vec<Task>,
}

/// Body of the atomic claim write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub display_number: u32,
    /// Always `running`: the claim is the queued-to-running transition
    pub status: ExecutionStatus,
    pub machine_id: String,
    pub machine_name: String,
    /// Always true; the backend serializes claims across machines
    pub atomic: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub claimed: bool,
    #[serde(default)]
    pub claimed_by: Option<String>,
}

/// A status transition, optionally carrying a lifecycle event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub display_number: u32,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<LifecycleEvent>,
}

impl StatusUpdate {
    pub fn new(display_number: u32, status: ExecutionStatus) -> Self {
        Self {
            display_number,
            status,
            summary: None,
            error: None,
            session_id: None,
            pr_url: None,
            event: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_pr_url(mut self, pr_url: impl Into<String>) -> Self {
        self.pr_url = Some(pr_url.into());
        self
    }

    pub fn with_event(mut self, event: LifecycleEvent) -> Self {
        self.event = Some(event);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub success: bool,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
