// SPDX-License-Identifier: MIT

//! Best-effort pull request creation after a successful run.
//!
//! If the task branch has commits the default branch lacks, push it and
//! invoke the PR-creation command. Every failure here (nothing to push,
//! command absent, PR already exists) is logged and swallowed; the run
//! already succeeded.

use crate::subprocess::{run_with_timeout, GIT_TIMEOUT, HOOK_TIMEOUT};
use std::path::Path;
use tokio::process::Command;

const DEFAULT_PR_PROGRAM: &str = "gh";

#[derive(Debug, Clone)]
pub struct PullRequestHook {
    /// The PR-creation command; `gh` unless overridden
    program: String,
}

impl Default for PullRequestHook {
    fn default() -> Self {
        Self { program: DEFAULT_PR_PROGRAM.to_string() }
    }
}

impl PullRequestHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Push `branch` and open a PR. Returns the PR URL when one was created.
    pub async fn open(
        &self,
        repo_path: &Path,
        branch: &str,
        title: &str,
        body: &str,
    ) -> Option<String> {
        let default_branch = default_branch(repo_path).await;
        if !has_unmerged_commits(repo_path, branch, &default_branch).await {
            tracing::debug!(branch, "no commits beyond {default_branch}, skipping PR");
            return None;
        }

        if !push_branch(repo_path, branch).await {
            return None;
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(["pr", "create", "--head", branch, "--title", title, "--body", body])
            .current_dir(repo_path);
        let output = match run_with_timeout(cmd, HOOK_TIMEOUT, "pr create").await {
            Ok(output) => output,
            Err(e) => {
                tracing::info!(error = %e, "PR creation unavailable");
                return None;
            }
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::info!(branch, stderr = %stderr.trim(), "PR creation declined");
            return None;
        }

        // First stdout line is the PR URL
        let stdout = String::from_utf8_lossy(&output.stdout);
        let url = stdout.lines().next().map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
        if let Some(ref url) = url {
            tracing::info!(branch, url, "opened pull request");
        }
        url
    }
}

/// `origin/HEAD`, falling back to `main`.
async fn default_branch(repo_path: &Path) -> String {
    let mut cmd = Command::new("git");
    cmd.args(["-C"])
        .arg(repo_path)
        .args(["symbolic-ref", "--short", "refs/remotes/origin/HEAD"]);
    if let Ok(output) = run_with_timeout(cmd, GIT_TIMEOUT, "git symbolic-ref").await {
        if output.status.success() {
            let name = String::from_utf8_lossy(&output.stdout);
            // "origin/main" -> "origin/main" is the comparable ref
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    "main".to_string()
}

/// Does `branch` carry commits that `default_branch` lacks?
async fn has_unmerged_commits(repo_path: &Path, branch: &str, default_branch: &str) -> bool {
    let mut cmd = Command::new("git");
    cmd.args(["-C"])
        .arg(repo_path)
        .args(["rev-list", "--count", &format!("{default_branch}..{branch}")]);
    match run_with_timeout(cmd, GIT_TIMEOUT, "git rev-list").await {
        Ok(output) if output.status.success() => {
            let count = String::from_utf8_lossy(&output.stdout);
            count.trim().parse::<u64>().map(|n| n > 0).unwrap_or(false)
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(branch, stderr = %stderr.trim(), "rev-list failed");
            false
        }
        Err(e) => {
            tracing::debug!(error = %e, "rev-list failed");
            false
        }
    }
}

async fn push_branch(repo_path: &Path, branch: &str) -> bool {
    let mut cmd = Command::new("git");
    cmd.args(["-C"]).arg(repo_path).args(["push", "-u", "origin", branch]);
    match run_with_timeout(cmd, GIT_TIMEOUT, "git push").await {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::info!(branch, stderr = %stderr.trim(), "push failed, skipping PR");
            false
        }
        Err(e) => {
            tracing::info!(error = %e, "push failed, skipping PR");
            false
        }
    }
}

#[cfg(test)]
#[path = "pr_tests.rs"]
mod tests;
