// SPDX-License-Identifier: MIT

//! Lifecycle events attached to status updates.

use crate::clock::rfc3339_from_epoch_ms;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventKind {
    Started,
    SessionFinished,
    Failed,
    DaemonShutdown,
}

/// Event payload the backend stores alongside a status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    #[serde(rename = "type")]
    pub kind: LifecycleEventKind,
    /// RFC 3339 UTC
    pub timestamp: String,
    pub machine_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl LifecycleEvent {
    pub fn new(kind: LifecycleEventKind, epoch_ms: u64, machine_name: &str) -> Self {
        Self {
            kind,
            timestamp: rfc3339_from_epoch_ms(epoch_ms),
            machine_name: machine_name.to_string(),
            summary: None,
            session_id: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
