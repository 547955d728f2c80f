// SPDX-License-Identifier: MIT

use super::*;
use crate::lifecycle::test_helpers::{test_config, write_api_key};
use serial_test::serial;

#[tokio::test]
#[serial(push_env)]
async fn startup_writes_pid_version_and_status() {
    std::env::remove_var("PUSH_API_KEY");
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    write_api_key(&config);

    let daemon = startup(&config).await.unwrap();

    let pid = std::fs::read_to_string(&config.pid_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    let version = std::fs::read_to_string(&config.version_path).unwrap();
    assert_eq!(version.trim(), env!("CARGO_PKG_VERSION"));

    let status = push_storage::StatusSnapshot::read(&config.state_dir).unwrap();
    assert!(status.running);
    assert_eq!(status.daemon.pid, std::process::id());

    // identity was persisted
    assert!(config.config_dir.join("machine_id").exists());
    drop(daemon);
}

#[tokio::test]
#[serial(push_env)]
async fn second_daemon_fails_to_lock() {
    std::env::remove_var("PUSH_API_KEY");
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    write_api_key(&config);

    let first = startup(&config).await.unwrap();
    let second = startup(&config).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));

    // the running daemon's PID file is untouched
    let pid = std::fs::read_to_string(&config.pid_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    drop(first);
}

#[tokio::test]
#[serial(push_env)]
async fn stale_pid_file_is_reaped() {
    std::env::remove_var("PUSH_API_KEY");
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    write_api_key(&config);

    // A dead daemon left its PID behind; nobody holds the lock.
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.pid_path, "999999\n").unwrap();

    let daemon = startup(&config).await.unwrap();
    let pid = std::fs::read_to_string(&config.pid_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    drop(daemon);
}

#[tokio::test]
#[serial(push_env)]
async fn missing_api_key_fails_startup_and_cleans_up() {
    std::env::remove_var("PUSH_API_KEY");
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    // no config file at all

    let result = startup(&config).await;
    assert!(matches!(result, Err(LifecycleError::NotConnected(_))));
    assert!(!config.pid_path.exists());
    assert!(!config.version_path.exists());
}

#[tokio::test]
#[serial(push_env)]
async fn machine_identity_is_stable_across_restarts() {
    std::env::remove_var("PUSH_API_KEY");
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    write_api_key(&config);

    let first = startup(&config).await.unwrap();
    let id_one = first.engine.identity().machine_id.clone();
    drop(first);

    let second = startup(&config).await.unwrap();
    let id_two = second.engine.identity().machine_id.clone();
    assert_eq!(id_one, id_two);
    drop(second);
}
