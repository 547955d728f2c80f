// SPDX-License-Identifier: MIT

//! Daemon startup: PID lock, version file, identity, engine wiring.

use super::{DaemonConfig, DaemonState, LifecycleError};
use fs2::FileExt;
use push_adapters::{
    CodingAgentAdapter, Decryptor, DesktopNotifier, KeychainDecryptor, PassthroughDecryptor,
    PullRequestHook,
};
use push_backend::BackendClient;
use push_core::SystemClock;
use push_engine::{Engine, EngineConfig, EngineDeps};
use push_storage::{load_or_create_identity, Settings};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Start the daemon
pub async fn startup(config: &DaemonConfig) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Don't clean up on a lock failure; those files belong to the
            // daemon that is already running.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &DaemonConfig) -> Result<DaemonState, LifecycleError> {
    // 1. Directories first; everything else writes into them.
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.config_dir)?;

    // 2. Acquire the PID lock. Open without truncating so a failed lock
    // does not wipe the running daemon's PID; a stale file from a dead
    // daemon locks fine and is overwritten below.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.pid_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    lock_file.flush()?;
    let lock_file = lock_file; // drop mutability

    // 3. Record our version for the CLI's self-restart check.
    std::fs::write(&config.version_path, concat!(env!("CARGO_PKG_VERSION"), "\n"))?;

    // 4. Identity and settings.
    let settings = Settings::load(&config.config_dir)?;
    let identity = load_or_create_identity(&config.config_dir, &crate::env::hostname())?;
    info!(machine_id = %identity.machine_id, "machine identity loaded");

    // 5. Optional end-to-end decryption via the keychain helper.
    let decryptor = build_decryptor().await;

    // 6. Backend client. Without an API key there is nothing to poll.
    let backend =
        BackendClient::new(config.api_url.clone(), settings.api_key.clone(), identity.clone())?;

    // 7. Engine.
    let mut engine_config =
        EngineConfig::new(config.config_dir.clone(), config.state_dir.clone());
    engine_config.auto_commit = settings.auto_commit;
    if let Some(program) = crate::env::agent_program() {
        engine_config.agent_program = program;
    }
    engine_config.allowed_tools = crate::env::allowed_tools();

    let engine = Engine::new(
        EngineDeps {
            backend: Arc::new(backend),
            agents: Arc::new(CodingAgentAdapter),
            notifier: Arc::new(DesktopNotifier::new()),
            decryptor,
            pr_hook: PullRequestHook::new(),
            identity,
        },
        engine_config,
        SystemClock,
    );

    // 8. Status file is live from the first moment.
    engine.write_status(true);

    Ok(DaemonState { config: config.clone(), engine, lock_file })
}

async fn build_decryptor() -> Arc<dyn Decryptor> {
    let helper = crate::env::keychain_helper();
    match KeychainDecryptor::from_helper(Path::new(&helper)).await {
        Some(decryptor) => {
            info!(helper, "end-to-end decryption enabled");
            Arc::new(decryptor)
        }
        None => {
            info!(helper, "no keychain key available, encrypted fields stay opaque");
            Arc::new(PassthroughDecryptor)
        }
    }
}

/// Clean up artifacts of a failed startup.
fn cleanup_on_failure(config: &DaemonConfig) {
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
    if config.pid_path.exists() {
        let _ = std::fs::remove_file(&config.pid_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
