// SPDX-License-Identifier: MIT

//! `push daemon` - daemon management commands

use crate::daemon_control::{self, EnsureOutcome};
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use push_storage::StatusSnapshot;
use std::path::Path;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (foreground or background)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Stop and restart the daemon
    Restart,
    /// Show daemon status
    Status,
    /// View daemon logs
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "200")]
        limit: usize,
    },
    /// Start the daemon if needed, restarting on a version change
    #[command(hide = true)]
    Ensure,
}

pub fn daemon(args: DaemonArgs) -> Result<()> {
    let state_dir = push_storage::paths::state_dir()?;
    match args.command {
        DaemonCommand::Start { foreground } => start(&state_dir, foreground),
        DaemonCommand::Stop => stop(&state_dir),
        DaemonCommand::Restart => restart(&state_dir),
        DaemonCommand::Status => status(&state_dir),
        DaemonCommand::Logs { limit } => logs(&state_dir, limit),
        DaemonCommand::Ensure => ensure(&state_dir),
    }
}

fn start(state_dir: &Path, foreground: bool) -> Result<()> {
    if foreground {
        let binary = daemon_control::find_pushd_binary();
        let status = std::process::Command::new(&binary).status()?;
        if !status.success() {
            return Err(anyhow!("daemon exited with status: {status}"));
        }
        return Ok(());
    }

    if let Some(pid) = daemon_control::running_pid(state_dir) {
        println!("Daemon already running (pid {pid})");
        return Ok(());
    }

    let pid = daemon_control::start_background(state_dir)?;
    println!("Daemon started (pid {pid})");
    Ok(())
}

fn stop(state_dir: &Path) -> Result<()> {
    if daemon_control::stop(state_dir)? {
        println!("Daemon stopped");
    } else {
        println!("Daemon not running");
    }
    Ok(())
}

fn restart(state_dir: &Path) -> Result<()> {
    daemon_control::stop(state_dir)?;
    let pid = daemon_control::start_background(state_dir)?;
    println!("Daemon restarted (pid {pid})");
    Ok(())
}

fn status(state_dir: &Path) -> Result<()> {
    let Some(pid) = daemon_control::running_pid(state_dir) else {
        println!("Daemon not running");
        return Ok(());
    };

    let Some(snapshot) = StatusSnapshot::read(state_dir) else {
        println!("Daemon running (pid {pid}), no status snapshot yet");
        return Ok(());
    };

    println!("Status: {}", if snapshot.running { "running" } else { "stopped" });
    println!("Version: {}", snapshot.daemon.version);
    println!("Machine: {} ({})", snapshot.daemon.machine_name, snapshot.daemon.machine_id_suffix);
    println!("Pid: {}", snapshot.daemon.pid);
    println!("Started: {}", snapshot.daemon.started_at);
    println!(
        "Tasks: {} running / {} max, {} completed today",
        snapshot.stats.running, snapshot.stats.max_concurrent, snapshot.stats.completed_today
    );
    for task in &snapshot.running_tasks {
        let phase = task.phase.as_deref().unwrap_or("-");
        let elapsed = task.elapsed_seconds.unwrap_or(0);
        println!("  #{} {} [{}] {}s", task.display_number, task.summary, phase, elapsed);
    }
    for task in &snapshot.queued_tasks {
        println!("  #{} {} [queued]", task.display_number, task.summary);
    }
    Ok(())
}

fn logs(state_dir: &Path, limit: usize) -> Result<()> {
    let path = daemon_control::log_path(state_dir);
    if !path.exists() {
        println!("No log file found at {}", path.display());
        return Ok(());
    }
    println!("{}", daemon_control::read_last_lines(&path, limit)?);
    Ok(())
}

fn ensure(state_dir: &Path) -> Result<()> {
    match daemon_control::ensure_daemon_running(state_dir)? {
        EnsureOutcome::AlreadyCurrent => println!("Daemon up to date"),
        EnsureOutcome::Started => println!("Daemon started"),
        EnsureOutcome::Restarted => {
            println!("Daemon restarted ({})", daemon_control::INSTALLED_VERSION)
        }
    }
    Ok(())
}
