// SPDX-License-Identifier: MIT

//! The execution engine: claim, worktree, supervise, report, clean up.
//!
//! One [`Engine`] per daemon. The scheduler tick is the only place that
//! adds running-task records; each run's finalizer (or the drain path)
//! is the only place that removes them.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod runner;
mod scheduler;
mod state;
mod status;
mod supervisor;
#[cfg(test)]
mod testkit;
mod worktree;

pub use scheduler::{Scheduler, TICK_INTERVAL};
pub use state::{EngineState, QueuedTask};
pub use supervisor::{build_prompt, extract_session_id, stuck_phrase, STUCK_PHRASES};
pub use worktree::{Worktree, WorktreeError, WorktreeManager};

use parking_lot::Mutex;
use push_adapters::{AgentAdapter, Decryptor, Notifier, PullRequestHook};
use push_backend::Backend;
use push_core::{Clock, MachineIdentity, MAX_CONCURRENT, TASK_TIMEOUT_SECS};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Collaborators the engine drives. All replaceable in tests.
pub struct EngineDeps {
    pub backend: Arc<dyn Backend>,
    pub agents: Arc<dyn AgentAdapter>,
    pub notifier: Arc<dyn Notifier>,
    pub decryptor: Arc<dyn Decryptor>,
    pub pr_hook: PullRequestHook,
    pub identity: MachineIdentity,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub config_dir: PathBuf,
    pub state_dir: PathBuf,
    /// Agent binary; `claude` in production, a stub in tests
    pub agent_program: String,
    /// `--allowed-tools` CSV passed through to the agent
    pub allowed_tools: Option<String>,
    /// `--output-format json`, so session ids are machine-readable
    pub json_output: bool,
    /// Prompt trailer asks for commits when set
    pub auto_commit: bool,
    pub max_concurrent: usize,
    pub task_timeout: Duration,
    /// SIGTERM → SIGKILL grace
    pub termination_grace: Duration,
    pub version: String,
}

impl EngineConfig {
    pub fn new(config_dir: PathBuf, state_dir: PathBuf) -> Self {
        Self {
            config_dir,
            state_dir,
            agent_program: push_adapters::agent::DEFAULT_AGENT_PROGRAM.to_string(),
            allowed_tools: None,
            json_output: true,
            auto_commit: true,
            max_concurrent: MAX_CONCURRENT,
            task_timeout: Duration::from_secs(TASK_TIMEOUT_SECS),
            termination_grace: Duration::from_secs(5),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub struct Engine<C: Clock> {
    deps: EngineDeps,
    config: EngineConfig,
    clock: C,
    state: Arc<Mutex<EngineState>>,
    worktrees: WorktreeManager,
    started_at_ms: u64,
    pid: u32,
}

impl<C: Clock> Engine<C> {
    pub fn new(deps: EngineDeps, config: EngineConfig, clock: C) -> Arc<Self> {
        let worktrees = WorktreeManager::new(deps.identity.suffix());
        let started_at_ms = clock.epoch_ms();
        Arc::new(Self {
            deps,
            config,
            clock,
            state: Arc::new(Mutex::new(EngineState::default())),
            worktrees,
            started_at_ms,
            pid: std::process::id(),
        })
    }

    pub fn state(&self) -> &Arc<Mutex<EngineState>> {
        &self.state
    }

    pub fn identity(&self) -> &MachineIdentity {
        &self.deps.identity
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }
}
