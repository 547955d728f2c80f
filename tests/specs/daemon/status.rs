// SPDX-License-Identifier: MIT

//! `push daemon status` against an empty state directory.

use crate::support::{stdout_contains, SpecHome};

#[test]
fn status_reports_not_running_when_nothing_is_up() {
    let home = SpecHome::new();
    let output = home.cli().args(["daemon", "status"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_contains(&output.stdout, "Daemon not running"));
}

#[test]
fn logs_handles_missing_log_file() {
    let home = SpecHome::new();
    let output = home.cli().args(["daemon", "logs"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_contains(&output.stdout, "No log file found"));
}

#[test]
fn stop_when_not_running_is_a_no_op() {
    let home = SpecHome::new();
    let output = home.cli().args(["daemon", "stop"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout_contains(&output.stdout, "Daemon not running"));
}
