// SPDX-License-Identifier: MIT

//! Git worktree lifecycle: one branch per task, one directory per run.
//!
//! `branch = push-{display_number}-{suffix}`; the worktree lives next to
//! the registered repo. The directory is destroyed after every run; the
//! branch is never deleted, so a re-run replays onto the same branch
//! through a fresh worktree.

use push_adapters::subprocess::{run_with_timeout, SubprocessError, GIT_TIMEOUT};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("git worktree add failed: {0}")]
    Create(String),

    #[error("git worktree remove failed: {0}")]
    Remove(String),

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

/// A materialized worktree for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
    pub path: PathBuf,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct WorktreeManager {
    /// The machine's 8-hex suffix, so machines sharing a repo never collide
    suffix: String,
    /// Concurrent `git worktree` mutations contend on repo-internal locks;
    /// serialize them (clones share the lock)
    git_lock: std::sync::Arc<tokio::sync::Mutex<()>>,
}

impl WorktreeManager {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { suffix: suffix.into(), git_lock: std::sync::Arc::new(tokio::sync::Mutex::new(())) }
    }

    pub fn branch_name(&self, display_number: u32) -> String {
        format!("push-{display_number}-{}", self.suffix)
    }

    /// Sibling of the repo, named after the branch.
    pub fn worktree_path(&self, repo_path: &Path, display_number: u32) -> PathBuf {
        let branch = self.branch_name(display_number);
        match repo_path.parent() {
            Some(parent) => parent.join(branch),
            None => repo_path.join(branch),
        }
    }

    /// Materialize the worktree for a task. Idempotent: an existing
    /// directory is reused; an existing branch is attached rather than
    /// recreated, so branch history is never rewritten.
    pub async fn create(
        &self,
        repo_path: &Path,
        display_number: u32,
    ) -> Result<Worktree, WorktreeError> {
        let branch = self.branch_name(display_number);
        let path = self.worktree_path(repo_path, display_number);

        let _guard = self.git_lock.lock().await;

        if path.exists() {
            tracing::debug!(path = %path.display(), "reusing existing worktree");
            return Ok(Worktree { path, branch });
        }

        // First run for this task: create branch and worktree together.
        let mut add_new = git_in(repo_path);
        add_new.args(["worktree", "add", "-b", &branch]).arg(&path);
        let output = run_with_timeout(add_new, GIT_TIMEOUT, "git worktree add -b").await?;
        if output.status.success() {
            return Ok(Worktree { path, branch });
        }

        // Branch already exists (a previous run created it): attach to it.
        let mut add_existing = git_in(repo_path);
        add_existing.args(["worktree", "add"]).arg(&path).arg(&branch);
        let retry = run_with_timeout(add_existing, GIT_TIMEOUT, "git worktree add").await?;
        if retry.status.success() {
            return Ok(Worktree { path, branch });
        }

        let stderr = String::from_utf8_lossy(&retry.stderr);
        Err(WorktreeError::Create(stderr.trim().to_string()))
    }

    /// Tear down the worktree directory. The branch stays.
    pub async fn remove(&self, worktree_path: &Path) -> Result<(), WorktreeError> {
        let _guard = self.git_lock.lock().await;

        if !worktree_path.exists() {
            return Ok(());
        }

        // Run from within the worktree so git can locate the parent repo.
        let mut cmd = Command::new("git");
        cmd.arg("worktree")
            .arg("remove")
            .arg(worktree_path)
            .arg("--force")
            .current_dir(worktree_path)
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE");
        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git worktree remove").await?;

        if !output.status.success() {
            // Clear remnants so the directory-absent invariant holds even
            // when git refuses (e.g. the worktree registration is gone).
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                path = %worktree_path.display(),
                stderr = %stderr.trim(),
                "git worktree remove failed, clearing directory"
            );
            std::fs::remove_dir_all(worktree_path)
                .map_err(|e| WorktreeError::Remove(e.to_string()))?;
        }
        Ok(())
    }
}

/// `git -C <repo>` with repo-env leakage stripped.
fn git_in(repo_path: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(repo_path).env_remove("GIT_DIR").env_remove("GIT_WORK_TREE");
    cmd
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
