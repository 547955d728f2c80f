// SPDX-License-Identifier: MIT

//! Spawning and observing the coding agent.
//!
//! The agent is any CLI with the fixed argument shape
//! `--print --dangerously-skip-permissions -p <prompt>`; the supervisor
//! consumes its stdout as a stream of lines and tolerates any exit code.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

/// Default agent binary.
pub const DEFAULT_AGENT_PROGRAM: &str = "claude";

/// Bytes of stderr retained for failure reports.
const STDERR_TAIL_BYTES: usize = 4096;

const LINE_CHANNEL_DEPTH: usize = 256;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to spawn `{program}`, is it installed and on PATH? ({source})")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("agent process has no capturable {0}")]
    MissingPipe(&'static str),
}

/// One agent launch, fully specified.
#[derive(Debug, Clone)]
pub struct AgentInvocation {
    pub program: String,
    pub prompt: String,
    /// `--allowed-tools <csv>` when set
    pub allowed_tools: Option<String>,
    /// `--output-format json` when set
    pub json_output: bool,
    /// The task's worktree
    pub cwd: PathBuf,
    /// Extra environment on top of the inherited one
    pub env: Vec<(String, String)>,
}

impl AgentInvocation {
    pub fn new(prompt: impl Into<String>, cwd: PathBuf) -> Self {
        Self {
            program: DEFAULT_AGENT_PROGRAM.to_string(),
            prompt: prompt.into(),
            allowed_tools: None,
            json_output: false,
            cwd,
            env: Vec::new(),
        }
    }
}

/// How the agent process ended.
#[derive(Debug, Clone)]
pub struct AgentExit {
    /// None when killed by signal
    pub code: Option<i32>,
    pub stderr_tail: String,
}

/// A live agent: its PID for signalling, its stdout line stream, and a
/// oneshot that fires once the process has been reaped.
pub struct AgentHandle {
    pub pid: Option<u32>,
    pub lines: mpsc::Receiver<String>,
    pub exit: oneshot::Receiver<AgentExit>,
}

#[async_trait]
pub trait AgentAdapter: Send + Sync + 'static {
    async fn spawn(&self, invocation: AgentInvocation) -> Result<AgentHandle, AgentError>;
}

/// Spawns the real agent CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodingAgentAdapter;

#[async_trait]
impl AgentAdapter for CodingAgentAdapter {
    async fn spawn(&self, invocation: AgentInvocation) -> Result<AgentHandle, AgentError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.arg("--print")
            .arg("--dangerously-skip-permissions")
            .arg("-p")
            .arg(&invocation.prompt);
        if let Some(ref tools) = invocation.allowed_tools {
            cmd.arg("--allowed-tools").arg(tools);
        }
        if invocation.json_output {
            cmd.arg("--output-format").arg("json");
        }
        cmd.current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| AgentError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        let pid = child.id();
        let stdout = child.stdout.take().ok_or(AgentError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(AgentError::MissingPipe("stderr"))?;

        let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_DEPTH);
        let (exit_tx, exit_rx) = oneshot::channel();

        // stdout pump: one line per send, empty lines dropped. Keeps
        // draining even if the receiver goes away so the child never
        // blocks on a full pipe.
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut receiver_gone = false;
            while let Ok(Some(line)) = lines.next_line().await {
                let trimmed = line.trim();
                if trimmed.is_empty() || receiver_gone {
                    continue;
                }
                if line_tx.send(trimmed.to_string()).await.is_err() {
                    receiver_gone = true;
                }
            }
        });

        // stderr + reaper: collect a bounded tail, then wait for exit.
        tokio::spawn(async move {
            let mut tail: Vec<u8> = Vec::new();
            let mut reader = BufReader::new(stderr);
            let mut chunk = [0u8; 1024];
            while let Ok(n) = reader.read(&mut chunk).await {
                if n == 0 {
                    break;
                }
                tail.extend_from_slice(&chunk[..n]);
                if tail.len() > STDERR_TAIL_BYTES {
                    let excess = tail.len() - STDERR_TAIL_BYTES;
                    tail.drain(..excess);
                }
            }

            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to reap agent process");
                    None
                }
            };
            let stderr_tail = String::from_utf8_lossy(&tail).into_owned();
            let _ = exit_tx.send(AgentExit { code, stderr_tail });
        });

        Ok(AgentHandle { pid, lines: line_rx, exit: exit_rx })
    }
}

/// Politely terminate an agent: SIGTERM, a grace period, then SIGKILL.
///
/// The reaper task owns `wait()`, so this only signals; exit is observed
/// through the handle's `exit` channel as usual.
#[cfg(unix)]
pub async fn terminate(pid: u32, grace: Duration) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(pid as i32);
    if kill(pid, Signal::SIGTERM).is_err() {
        return; // already gone
    }

    let poll_every = Duration::from_millis(100);
    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        tokio::time::sleep(poll_every).await;
        if kill(pid, None).is_err() {
            return; // exited within the grace period
        }
    }

    tracing::warn!(pid = pid.as_raw(), "agent ignored SIGTERM, sending SIGKILL");
    let _ = kill(pid, Signal::SIGKILL);
}

#[cfg(not(unix))]
pub async fn terminate(_pid: u32, _grace: Duration) {}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Script for one fake agent run.
    #[derive(Debug, Clone)]
    pub struct FakeAgentScript {
        pub lines: Vec<String>,
        pub exit_code: i32,
        pub stderr_tail: String,
        /// Delay between lines, and before exit
        pub line_delay: Duration,
    }

    impl Default for FakeAgentScript {
        fn default() -> Self {
            Self {
                lines: vec!["working".to_string()],
                exit_code: 0,
                stderr_tail: String::new(),
                line_delay: Duration::ZERO,
            }
        }
    }

    /// Plays scripted output instead of spawning a process.
    #[derive(Clone, Default)]
    pub struct FakeAgentAdapter {
        scripts: Arc<Mutex<Vec<FakeAgentScript>>>,
        invocations: Arc<Mutex<Vec<AgentInvocation>>>,
    }

    impl FakeAgentAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the script for the next spawn (first queued, first played).
        pub fn push_script(&self, script: FakeAgentScript) {
            self.scripts.lock().push(script);
        }

        pub fn invocations(&self) -> Vec<AgentInvocation> {
            self.invocations.lock().clone()
        }
    }

    #[async_trait]
    impl AgentAdapter for FakeAgentAdapter {
        async fn spawn(&self, invocation: AgentInvocation) -> Result<AgentHandle, AgentError> {
            self.invocations.lock().push(invocation);
            let script = {
                let mut scripts = self.scripts.lock();
                if scripts.is_empty() {
                    FakeAgentScript::default()
                } else {
                    scripts.remove(0)
                }
            };

            let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_DEPTH);
            let (exit_tx, exit_rx) = oneshot::channel();

            tokio::spawn(async move {
                for line in script.lines {
                    if !script.line_delay.is_zero() {
                        tokio::time::sleep(script.line_delay).await;
                    }
                    if line_tx.send(line).await.is_err() {
                        break;
                    }
                }
                drop(line_tx);
                let _ = exit_tx.send(AgentExit {
                    code: Some(script.exit_code),
                    stderr_tail: script.stderr_tail,
                });
            });

            Ok(AgentHandle { pid: None, lines: line_rx, exit: exit_rx })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgentAdapter, FakeAgentScript};

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
