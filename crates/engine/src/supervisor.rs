// SPDX-License-Identifier: MIT

//! Observation of a running agent: output tail, stuck phrases, session id.
//!
//! The supervisor consumes the stdout line stream until EOF, then collects
//! the exit. It never kills anything itself; the timeout sweep and the
//! drain path send signals; death shows up here as EOF + exit.

use crate::state::EngineState;
use parking_lot::Mutex;
use push_adapters::{AgentExit, AgentHandle, Notifier};
use push_core::Clock;
use std::sync::Arc;

/// Phrases that mean the agent is waiting for interactive input it will
/// never get. Matched case-insensitively, first hit wins.
pub const STUCK_PHRASES: [&str; 5] =
    ["waiting for permission", "y/n", "press enter", "plan ready for approval", "confirm:"];

/// Scan one output line for a stuck phrase.
pub fn stuck_phrase(line: &str) -> Option<&'static str> {
    let line = line.to_ascii_lowercase();
    STUCK_PHRASES.iter().copied().find(|phrase| line.contains(phrase))
}

/// The inline prompt handed to the agent: the task content plus the fixed
/// trailer.
pub fn build_prompt(content: &str, auto_commit: bool) -> String {
    let mut prompt = content.trim().to_string();
    prompt.push_str(
        "\n\nFollow any contributor conventions documented in this repository \
         (CLAUDE.md, CONTRIBUTING.md or similar).",
    );
    if auto_commit {
        prompt.push_str(" Commit all changes with clear messages before finishing.");
    }
    prompt.push_str(" Exit cleanly when the task is complete.");
    prompt
}

/// Recognize a session id anywhere in stdout: any line that parses as a
/// JSON object with a string `session_id`.
pub fn extract_session_id(line: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.get("session_id")?.as_str().map(str::to_string)
}

/// Everything the finalizer needs to know about a finished agent.
#[derive(Debug)]
pub(crate) struct Supervision {
    pub exit: AgentExit,
    pub session_id: Option<String>,
}

/// Drive one agent to completion, mirroring its output into the running
/// record. Writes only the observation fields; the record itself belongs
/// to the runner.
pub(crate) async fn supervise<C: Clock>(
    state: &Arc<Mutex<EngineState>>,
    display_number: u32,
    mut handle: AgentHandle,
    clock: &C,
    notifier: &dyn Notifier,
) -> Supervision {
    {
        let mut state = state.lock();
        state.with_running_mut(display_number, |record| {
            record.agent_pid = handle.pid;
        });
    }

    let mut session_id = None;

    while let Some(line) = handle.lines.recv().await {
        if let Some(found) = extract_session_id(&line) {
            session_id = Some(found);
        }

        let now_ms = clock.epoch_ms();
        let stuck = stuck_phrase(&line);
        let newly_stuck = {
            let mut state = state.lock();
            state
                .with_running_mut(display_number, |record| {
                    record.record_output(&line, now_ms);
                    match stuck {
                        Some(phrase) => record.mark_stuck(phrase),
                        None => {
                            record.clear_stuck();
                            false
                        }
                    }
                })
                .unwrap_or(false)
        };

        if newly_stuck {
            // unwrap_or above: only reachable when the record is live
            let phrase = stuck.unwrap_or_default();
            tracing::warn!(display_number, phrase, "agent appears stuck on interactive input");
            notifier.notify(
                &format!("Task #{display_number} appears stuck"),
                &format!("Agent output matched \"{phrase}\""),
            );
        }
    }

    let exit = match handle.exit.await {
        Ok(exit) => exit,
        Err(_) => {
            tracing::warn!(display_number, "agent exit channel dropped");
            AgentExit { code: None, stderr_tail: String::new() }
        }
    };

    Supervision { exit, session_id }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
