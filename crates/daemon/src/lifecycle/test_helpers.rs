// SPDX-License-Identifier: MIT

//! Shared fixtures for lifecycle tests.

use super::DaemonConfig;
use std::path::Path;
use std::time::Duration;

pub(crate) fn test_config(root: &Path) -> DaemonConfig {
    let state_dir = root.join("state");
    DaemonConfig {
        config_dir: root.join("config"),
        pid_path: state_dir.join("daemon.pid"),
        version_path: state_dir.join("daemon.version"),
        log_path: state_dir.join("daemon.log"),
        tick_interval: Duration::from_millis(100),
        api_url: "http://127.0.0.1:9".to_string(),
        state_dir,
    }
}

pub(crate) fn write_api_key(config: &DaemonConfig) {
    std::fs::create_dir_all(&config.config_dir).unwrap();
    std::fs::write(config.config_dir.join("config"), "PUSH_API_KEY=test-key\n").unwrap();
}
