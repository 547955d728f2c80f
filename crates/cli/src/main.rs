// SPDX-License-Identifier: MIT

//! `push`: daemon management front-end.
//!
//! The interactive task surface (listing, queueing, watch UI, connect)
//! lives elsewhere; this binary manages the execution daemon itself.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod daemon_control;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "push", version, about = "Voice tasks to coding agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the task execution daemon
    Daemon(commands::daemon::DaemonArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("push: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Daemon(args) => commands::daemon::daemon(args),
    }
}
