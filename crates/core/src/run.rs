// SPDX-License-Identifier: MIT

//! In-memory records for runs in flight and runs finished today.
//!
//! Ownership: the runner owns a [`RunningTask`] from claim until cleanup.
//! The supervisor writes only the mutable observation fields
//! (`last_output_at_ms`, `tail`, `phase`, `phase_detail`, `agent_pid`).

use crate::repo::RepoUrl;
use crate::ring::TailBuffer;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a run currently is, as observed from its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Claimed, worktree being prepared or agent not yet spawned
    Starting,
    /// Agent producing output
    Executing,
    /// Agent appears to wait for interactive input
    Stuck,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Executing => "executing",
            Self::Stuck => "stuck",
        }
    }
}

/// How a finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    SessionFinished,
    Failed,
    Timeout,
}

/// One task currently being executed on this machine.
#[derive(Debug, Clone)]
pub struct RunningTask {
    pub task_id: String,
    pub display_number: u32,
    pub summary: String,
    pub repo_url: RepoUrl,
    pub repo_path: PathBuf,
    pub worktree_path: PathBuf,
    pub branch: String,
    pub started_at_ms: u64,
    pub agent_pid: Option<u32>,
    pub last_output_at_ms: u64,
    pub tail: TailBuffer,
    pub phase: RunPhase,
    pub phase_detail: Option<String>,
    /// Set by the timeout sweep; the finalizer reports Timeout instead of
    /// whatever exit the killed child produced
    pub timed_out: bool,
    /// Idle surfacing fired; reset when output resumes
    pub idle_notified: bool,
}

impl RunningTask {
    pub fn new(
        task: &crate::task::Task,
        repo_path: PathBuf,
        worktree_path: PathBuf,
        branch: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            task_id: task.task_id.clone(),
            display_number: task.display_number,
            summary: task.summary.clone(),
            repo_url: task.repo_url.clone(),
            repo_path,
            worktree_path,
            branch: branch.into(),
            started_at_ms: now_ms,
            agent_pid: None,
            last_output_at_ms: now_ms,
            tail: TailBuffer::default(),
            phase: RunPhase::Starting,
            phase_detail: None,
            timed_out: false,
            idle_notified: false,
        }
    }

    /// Record one non-empty output line.
    pub fn record_output(&mut self, line: &str, now_ms: u64) {
        self.last_output_at_ms = now_ms;
        self.tail.push(line);
        self.idle_notified = false;
        if self.phase == RunPhase::Starting {
            self.phase = RunPhase::Executing;
        }
    }

    /// Transition to stuck. Returns false when already stuck (dedup).
    pub fn mark_stuck(&mut self, reason: &str) -> bool {
        if self.phase == RunPhase::Stuck {
            return false;
        }
        self.phase = RunPhase::Stuck;
        self.phase_detail = Some(reason.to_string());
        true
    }

    /// Stuck clears as soon as the agent produces output again.
    pub fn clear_stuck(&mut self) {
        if self.phase == RunPhase::Stuck {
            self.phase = RunPhase::Executing;
            self.phase_detail = None;
        }
    }

    pub fn elapsed_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms) / 1000
    }

    /// Idle time counts from the last output, not from the start.
    pub fn idle_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_output_at_ms) / 1000
    }
}

/// A run that finished since the daemon started. Memory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRun {
    pub display_number: u32,
    pub summary: String,
    /// RFC 3339 UTC
    pub completed_at: String,
    pub duration_seconds: u64,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
