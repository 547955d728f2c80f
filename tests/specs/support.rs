// SPDX-License-Identifier: MIT

//! Helpers shared by the daemon specs.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// An isolated config + state home for one spec.
pub struct SpecHome {
    pub root: tempfile::TempDir,
}

impl SpecHome {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("config")).unwrap();
        std::fs::write(
            root.path().join("config/config"),
            "PUSH_API_KEY=spec-test-key\n",
        )
        .unwrap();
        Self { root }
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.path().join("config")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.path().join("state")
    }

    /// Env vars every spawned binary gets: isolated dirs, an unreachable
    /// backend (connection refused), and a fast tick.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("PUSH_CONFIG_DIR", self.config_dir().display().to_string()),
            ("PUSH_STATE_DIR", self.state_dir().display().to_string()),
            ("PUSH_API_URL", "http://127.0.0.1:9".to_string()),
            ("PUSH_TICK_MS", "200".to_string()),
            ("PUSH_MACHINE_NAME", "specbox".to_string()),
        ]
    }

    pub fn cli(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("push").unwrap();
        for (key, value) in self.env() {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn spawn_daemon(&self) -> std::process::Child {
        let binary = assert_cmd::cargo::cargo_bin("pushd");
        let mut cmd = std::process::Command::new(binary);
        for (key, value) in self.env() {
            cmd.env(key, value);
        }
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .unwrap()
    }

    pub fn pid_file(&self) -> PathBuf {
        self.state_dir().join("daemon.pid")
    }

    pub fn version_file(&self) -> PathBuf {
        self.state_dir().join("daemon.version")
    }

    pub fn status_json(&self) -> Option<serde_json::Value> {
        let text = std::fs::read_to_string(self.state_dir().join("daemon_status.json")).ok()?;
        serde_json::from_str(&text).ok()
    }
}

pub fn wait_for(what: &str, timeout: Duration, mut predicate: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !predicate() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(100));
    }
}

pub fn stdout_contains(output: &[u8], needle: &str) -> bool {
    String::from_utf8_lossy(output).contains(needle)
}
