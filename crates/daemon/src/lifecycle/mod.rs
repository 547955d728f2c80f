// SPDX-License-Identifier: MIT

//! Daemon lifecycle management: startup, shutdown, crash handling.

mod shutdown;
mod startup;
pub use shutdown::shutdown;
pub use startup::startup;

#[cfg(test)]
pub(crate) mod test_helpers;

use push_core::SystemClock;
use push_engine::Engine;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Per-user config directory (config, machine_id, projects.json)
    pub config_dir: PathBuf,
    /// Root state directory (e.g. ~/.local/state/push)
    pub state_dir: PathBuf,
    /// Path to PID/lock file
    pub pid_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Scheduler tick interval
    pub tick_interval: Duration,
    /// Backend base URL
    pub api_url: String,
}

impl DaemonConfig {
    /// Resolve all paths and knobs from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let config_dir = push_storage::paths::config_dir()?;
        let state_dir = push_storage::paths::state_dir()?;
        Ok(Self {
            config_dir,
            pid_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            tick_interval: crate::env::tick_interval(),
            api_url: crate::env::api_url(),
            state_dir,
        })
    }
}

/// Live daemon state returned by startup.
pub struct DaemonState {
    pub config: DaemonConfig,
    pub engine: Arc<Engine<SystemClock>>,
    // NOTE(lifetime): held to maintain the exclusive PID-file lock;
    // released on drop
    #[allow(dead_code)]
    pub(crate) lock_file: File,
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory: {0}")]
    Paths(#[from] push_storage::StorageError),

    #[error("failed to acquire PID lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("not connected: {0}")]
    NotConnected(#[from] push_backend::BackendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
