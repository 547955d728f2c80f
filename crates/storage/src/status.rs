// SPDX-License-Identifier: MIT

//! The daemon status snapshot: `<state_dir>/daemon_status.json`.
//!
//! Ground truth for the CLI's watch mode. There is no IPC channel besides
//! this document and the PID file, so it is rewritten atomically after every
//! meaningful state change and at the end of each scheduler tick.

use crate::{write_json_atomic, StorageError};
use push_core::CompletedRun;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STATUS_FILE: &str = "daemon_status.json";

/// How many completed runs the snapshot retains.
pub const COMPLETED_SNAPSHOT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonInfo {
    pub pid: u32,
    pub version: String,
    /// RFC 3339 UTC
    pub started_at: String,
    pub machine_name: String,
    pub machine_id_suffix: String,
}

/// One task as shown to status readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusEntry {
    pub display_number: u32,
    pub summary: String,
    /// Backend execution status: `running`, `queued`, ...
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusStats {
    pub running: usize,
    pub max_concurrent: usize,
    pub completed_today: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub daemon: DaemonInfo,
    pub running: bool,
    pub active_tasks: Vec<TaskStatusEntry>,
    pub running_tasks: Vec<TaskStatusEntry>,
    pub queued_tasks: Vec<TaskStatusEntry>,
    /// Last [`COMPLETED_SNAPSHOT_LIMIT`] completions, newest last
    pub completed_today: Vec<CompletedRun>,
    pub stats: StatusStats,
    /// RFC 3339 UTC
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,
}

impl StatusSnapshot {
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(STATUS_FILE)
    }

    pub fn write(&self, state_dir: &Path) -> Result<(), StorageError> {
        write_json_atomic(&Self::path(state_dir), self)
    }

    /// Read the snapshot. Missing file → `None`; corrupt → `None` (logged).
    /// The daemon overwrites corrupt snapshots on its next write.
    pub fn read(state_dir: &Path) -> Option<Self> {
        let path = Self::path(state_dir);
        let text = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt status snapshot");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
