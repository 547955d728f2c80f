// SPDX-License-Identifier: MIT

//! Graceful stop: drain running tasks, final status snapshot, remove the
//! PID and version files.

use super::DaemonState;
use tracing::info;

pub async fn shutdown(daemon: DaemonState) {
    info!("shutting down");

    // 1. Drain: SIGTERM children, report failed + daemon_shutdown per
    // task, remove worktrees. The backend never keeps a `running` task
    // for a daemon that exited cleanly.
    daemon.engine.drain().await;

    // 2. Final snapshot: running=false with stoppedAt.
    daemon.engine.write_status(false);

    // 3. Remove version file.
    if daemon.config.version_path.exists() {
        if let Err(e) = std::fs::remove_file(&daemon.config.version_path) {
            tracing::warn!(error = %e, "failed to remove version file");
        }
    }

    // 4. Remove PID file. The lock itself releases when `lock_file` drops.
    if daemon.config.pid_path.exists() {
        if let Err(e) = std::fs::remove_file(&daemon.config.pid_path) {
            tracing::warn!(error = %e, "failed to remove PID file");
        }
    }

    info!("shutdown complete");
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
