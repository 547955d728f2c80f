// SPDX-License-Identifier: MIT

//! Full daemon lifecycle: start, status surface, version self-restart,
//! graceful stop. The backend is an unreachable address, so the daemon
//! idles on failed polls, which is exactly the resilient behavior under test.

use crate::support::{stdout_contains, wait_for, SpecHome};
use serial_test::serial;
use std::time::Duration;

#[test]
#[serial(daemon_spec)]
fn daemon_lifecycle_start_status_stop() {
    let home = SpecHome::new();
    let mut child = home.spawn_daemon();

    wait_for("PID file", Duration::from_secs(15), || home.pid_file().exists());
    wait_for("status snapshot", Duration::from_secs(15), || {
        home.status_json().map(|s| s["running"] == true).unwrap_or(false)
    });

    // the version file records the daemon's build
    let recorded = std::fs::read_to_string(home.version_file()).unwrap();
    assert!(!recorded.trim().is_empty());

    // the CLI sees it
    let output = home.cli().args(["daemon", "status"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_contains(&output.stdout, "Status: running"));
    assert!(stdout_contains(&output.stdout, "specbox"));

    // graceful stop: SIGTERM via the CLI, everything cleaned up
    let output = home.cli().args(["daemon", "stop"]).output().unwrap();
    assert!(output.status.success(), "stop failed: {:?}", output);
    assert!(stdout_contains(&output.stdout, "Daemon stopped"));

    let _ = child.wait();
    assert!(!home.pid_file().exists());
    assert!(!home.version_file().exists());

    let status = home.status_json().unwrap();
    assert_eq!(status["running"], false);
    assert!(status["stoppedAt"].is_string());
}

#[test]
#[serial(daemon_spec)]
fn ensure_restarts_on_version_mismatch() {
    let home = SpecHome::new();
    let mut child = home.spawn_daemon();
    wait_for("PID file", Duration::from_secs(15), || home.pid_file().exists());
    let first_pid =
        std::fs::read_to_string(home.pid_file()).unwrap().trim().parse::<u32>().unwrap();

    // ensure with a matching version: nothing happens
    let output = home.cli().args(["daemon", "ensure"]).output().unwrap();
    assert!(stdout_contains(&output.stdout, "Daemon up to date"));

    // simulate a stale daemon from an older install
    std::fs::write(home.version_file(), "0.0.1\n").unwrap();
    let output = home.cli().args(["daemon", "ensure"]).output().unwrap();
    assert!(output.status.success(), "ensure failed: {:?}", output);
    assert!(stdout_contains(&output.stdout, "Daemon restarted"));

    let _ = child.wait();
    let second_pid =
        std::fs::read_to_string(home.pid_file()).unwrap().trim().parse::<u32>().unwrap();
    assert_ne!(first_pid, second_pid);

    // the fresh daemon recorded the current version again
    let recorded = std::fs::read_to_string(home.version_file()).unwrap();
    assert_ne!(recorded.trim(), "0.0.1");

    // clean up the restarted daemon
    home.cli().args(["daemon", "stop"]).assert().success();
}
