// SPDX-License-Identifier: MIT

//! Process-level control of the pushd daemon: PID discovery, start, stop,
//! and the version-mismatch self-restart used by `ensure`.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const START_WAIT: Duration = Duration::from_secs(10);
const STOP_WAIT: Duration = Duration::from_secs(15);

/// The version this CLI was built as. The daemon records its own into
/// `daemon.version` at startup; a mismatch triggers a restart.
pub const INSTALLED_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn pid_path(state_dir: &Path) -> PathBuf {
    state_dir.join("daemon.pid")
}

pub fn version_path(state_dir: &Path) -> PathBuf {
    state_dir.join("daemon.version")
}

pub fn log_path(state_dir: &Path) -> PathBuf {
    state_dir.join("daemon.log")
}

/// PID from the lock file, if the file exists and parses.
pub fn read_pid(state_dir: &Path) -> Option<u32> {
    let text = std::fs::read_to_string(pid_path(state_dir)).ok()?;
    text.trim().parse().ok()
}

#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn is_alive(_pid: u32) -> bool {
    false
}

/// The daemon's PID when it is actually running (file present, process
/// alive).
pub fn running_pid(state_dir: &Path) -> Option<u32> {
    read_pid(state_dir).filter(|&pid| is_alive(pid))
}

/// Version recorded by the running daemon.
pub fn recorded_version(state_dir: &Path) -> Option<String> {
    let text = std::fs::read_to_string(version_path(state_dir)).ok()?;
    let version = text.trim().to_string();
    (!version.is_empty()).then_some(version)
}

/// Restart iff a version is recorded and differs from the installed one.
pub fn needs_restart(recorded: Option<&str>, installed: &str) -> bool {
    matches!(recorded, Some(recorded) if recorded != installed)
}

/// Locate the pushd binary: next to this executable first, then PATH.
pub fn find_pushd_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("pushd");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("pushd")
}

/// Spawn pushd detached and wait for its PID file to appear.
pub fn start_background(state_dir: &Path) -> Result<u32> {
    let binary = find_pushd_binary();
    std::process::Command::new(&binary)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {}", binary.display()))?;

    let deadline = Instant::now() + START_WAIT;
    while Instant::now() < deadline {
        if let Some(pid) = running_pid(state_dir) {
            return Ok(pid);
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    Err(anyhow!(
        "daemon did not come up within {}s, check {}",
        START_WAIT.as_secs(),
        log_path(state_dir).display()
    ))
}

/// SIGTERM the daemon and wait for it to go away. `Ok(false)` when it was
/// not running.
pub fn stop(state_dir: &Path) -> Result<bool> {
    let Some(pid) = running_pid(state_dir) else {
        // Clear a stale PID file from a crashed daemon.
        let _ = std::fs::remove_file(pid_path(state_dir));
        return Ok(false);
    };

    #[cfg(unix)]
    nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGTERM,
    )
    .map_err(|e| anyhow!("failed to signal pid {pid}: {e}"))?;
    #[cfg(not(unix))]
    return Err(anyhow!("stopping the daemon is only supported on unix"));

    let deadline = Instant::now() + STOP_WAIT;
    while Instant::now() < deadline {
        if !is_alive(pid) {
            return Ok(true);
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    Err(anyhow!("daemon (pid {pid}) did not stop within {}s", STOP_WAIT.as_secs()))
}

/// What `ensure` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    AlreadyCurrent,
    Started,
    Restarted,
}

/// Make sure a daemon of the installed version is running. The sole
/// in-band update mechanism: privileged CLI operations call this, and a
/// version mismatch replaces the running daemon.
pub fn ensure_daemon_running(state_dir: &Path) -> Result<EnsureOutcome> {
    match running_pid(state_dir) {
        None => {
            start_background(state_dir)?;
            Ok(EnsureOutcome::Started)
        }
        Some(_) => {
            let recorded = recorded_version(state_dir);
            if needs_restart(recorded.as_deref(), INSTALLED_VERSION) {
                stop(state_dir)?;
                start_background(state_dir)?;
                Ok(EnsureOutcome::Restarted)
            } else {
                Ok(EnsureOutcome::AlreadyCurrent)
            }
        }
    }
}

/// Last `limit` lines of a file.
pub fn read_last_lines(path: &Path, limit: usize) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(limit);
    Ok(lines[start..].join("\n"))
}

#[cfg(test)]
#[path = "daemon_control_tests.rs"]
mod tests;
