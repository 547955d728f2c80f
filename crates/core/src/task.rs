// SPDX-License-Identifier: MIT

//! Tasks as the backend delivers them.

use crate::repo::RepoUrl;
use serde::{Deserialize, Serialize};

/// Backend-managed execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Queued,
    Running,
    SessionFinished,
    Failed,
    NeedsClarification,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::SessionFinished => "session_finished",
            Self::Failed => "failed",
            Self::NeedsClarification => "needs_clarification",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attachment metadata (screenshots, links). Carried through, never consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One user-captured task, as received from the backend (post-decrypt).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque identifier, unique across all users
    pub task_id: String,
    /// Human-facing handle, unique per user, stable for the task's lifetime
    pub display_number: u32,
    #[serde(default)]
    pub summary: String,
    /// The instruction handed to the agent
    #[serde(default)]
    pub content: String,
    pub repo_url: RepoUrl,
    pub execution_status: ExecutionStatus,
    /// Set when summary/content/original_transcript arrive as ciphertext
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub original_transcript: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Task {
    /// Only queued tasks are candidates for execution.
    pub fn is_queued(&self) -> bool {
        self.execution_status == ExecutionStatus::Queued
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
