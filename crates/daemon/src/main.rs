// SPDX-License-Identifier: MIT

//! pushd: the push task execution daemon.
//!
//! Polls the backend for queued tasks, claims them atomically, runs the
//! coding agent in a per-task git worktree, and reports lifecycle state.
//! Exit code is always 0; the log and the status file are the
//! observability surface.

use push_daemon::lifecycle::{shutdown, startup, DaemonConfig, LifecycleError};
use push_daemon::logging;
use push_engine::Scheduler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Also to stderr: the log writer may be the thing that failed.
        eprintln!("pushd: {e}");
        error!(error = %e, "daemon exited with error");
    }
}

async fn run() -> Result<(), LifecycleError> {
    let config = DaemonConfig::load()?;
    std::fs::create_dir_all(&config.state_dir)?;
    let _log_guard = logging::init(&config.log_path)?;

    let daemon = startup(&config).await?;
    info!(version = env!("CARGO_PKG_VERSION"), pid = std::process::id(), "daemon started");

    let shutdown_token = CancellationToken::new();
    spawn_signal_listener(shutdown_token.clone());
    install_panic_hook(shutdown_token.clone());

    let scheduler = Scheduler::new(daemon.engine.clone(), config.tick_interval);
    scheduler.run(shutdown_token).await;

    shutdown(daemon).await;
    info!("daemon stopped");
    Ok(())
}

/// SIGTERM and SIGINT trigger a graceful drain. No other signals are
/// observed.
fn spawn_signal_listener(token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut term = match signal(SignalKind::terminate()) {
                Ok(term) => term,
                Err(e) => {
                    error!(error = %e, "cannot install SIGTERM handler");
                    return;
                }
            };
            let mut int = match signal(SignalKind::interrupt()) {
                Ok(int) => int,
                Err(e) => {
                    error!(error = %e, "cannot install SIGINT handler");
                    return;
                }
            };
            tokio::select! {
                _ = term.recv() => info!("SIGTERM received, draining"),
                _ = int.recv() => info!("SIGINT received, draining"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received, draining");
        }
        token.cancel();
    });
}

/// A panic anywhere must still run the stop path, so the backend is not
/// left holding `running` tasks for a dead daemon.
fn install_panic_hook(token: CancellationToken) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!("panic: {info}");
        token.cancel();
        default_hook(info);
    }));
}
