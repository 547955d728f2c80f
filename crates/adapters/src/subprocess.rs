// SPDX-License-Identifier: MIT

//! Run a subprocess to completion under a deadline.

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Deadline for every git invocation (worktree add/remove, push, rev-list).
pub const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for the keychain helper and the PR-creation command.
pub const HOOK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{label} timed out after {}s", timeout.as_secs())]
    Timeout { label: &'static str, timeout: Duration },

    #[error("{label} failed to run: {source}")]
    Io {
        label: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Collect the output of `cmd`, killing it if `timeout` elapses first.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    label: &'static str,
) -> Result<Output, SubprocessError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(SubprocessError::Io { label, source }),
        Err(_) => Err(SubprocessError::Timeout { label, timeout }),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
