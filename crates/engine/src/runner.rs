// SPDX-License-Identifier: MIT

//! One task, end to end: gate, claim, worktree, agent, report, cleanup.

use crate::supervisor::{build_prompt, supervise, Supervision};
use crate::Engine;
use push_adapters::agent::{terminate, AgentInvocation};
use push_backend::StatusUpdate;
use push_core::{
    rfc3339_from_epoch_ms, Clock, CompletedRun, ExecutionStatus, LifecycleEvent,
    LifecycleEventKind, Outcome, RunningTask, Task,
};
use push_storage::ProjectRegistry;
use std::path::PathBuf;

/// Characters of stderr included in a failure report.
const STDERR_REPORT_CHARS: usize = 200;

impl<C: Clock> Engine<C> {
    /// Run one polled task to completion. Every exit from this function
    /// leaves no running record and no worktree directory behind.
    pub async fn execute_task(&self, task: Task) {
        let display_number = task.display_number;

        // Gate: cheap local reasons not to claim.
        {
            let state = self.state.lock();
            if state.is_draining() {
                return;
            }
            if state.is_running(display_number) {
                tracing::debug!(display_number, "already running here, skipping");
                return;
            }
            if state.running_count() >= self.config.max_concurrent {
                tracing::debug!(display_number, "concurrency cap reached, skipping");
                return;
            }
        }

        let mut registry = match ProjectRegistry::load(&self.config.config_dir) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(error = %e, "cannot load project registry, skipping task");
                return;
            }
        };

        // No registered checkout: leave the task queued for a machine that
        // has one. No claim, no status write.
        let Some(repo_path) = registry.resolve(&task.repo_url).map(PathBuf::from) else {
            tracing::warn!(
                display_number,
                repo_url = %task.repo_url,
                "no local checkout registered for repo, leaving task queued"
            );
            return;
        };

        if !repo_path.exists() {
            let reason = format!(
                "Registered path {} for {} does not exist on this machine",
                repo_path.display(),
                task.repo_url
            );
            tracing::warn!(display_number, %reason, "refusing task");
            self.report(
                StatusUpdate::new(display_number, ExecutionStatus::Failed)
                    .with_error(reason)
                    .with_event(self.event(LifecycleEventKind::Failed)),
            )
            .await;
            return;
        }

        // Reserve the display number before claiming so a racing tick can
        // never double-claim. The backend's atomic claim stays the real
        // guarantee; this is the local cross-check.
        let now_ms = self.clock().epoch_ms();
        let branch = self.worktrees.branch_name(display_number);
        let worktree_path = self.worktrees.worktree_path(&repo_path, display_number);
        let record = RunningTask::new(&task, repo_path.clone(), worktree_path, &branch, now_ms);
        {
            let mut state = self.state.lock();
            if state.is_draining() || !state.try_insert_running(record) {
                return;
            }
        }

        match self.deps.backend.claim(display_number).await {
            Ok(outcome) if outcome.claimed => {}
            Ok(outcome) => {
                // Another machine won the race; drop silently.
                tracing::debug!(
                    display_number,
                    claimed_by = outcome.claimed_by.as_deref().unwrap_or("unknown"),
                    "task claimed elsewhere"
                );
                let _ = self.state.lock().remove_running(display_number);
                return;
            }
            Err(e) => {
                tracing::warn!(display_number, error = %e, "claim failed, leaving task queued");
                let _ = self.state.lock().remove_running(display_number);
                return;
            }
        }

        // Drain may have taken the record while the claim was in flight;
        // if so the shutdown report already went out, so do not start work.
        if !self.state.lock().is_running(display_number) {
            return;
        }

        // Claimed: this run is happening here. Bump the registry's
        // last-used marker (execution only; status reads never write).
        registry.touch_last_used(&task.repo_url, &rfc3339_from_epoch_ms(now_ms));
        if let Err(e) = registry.save(&self.config.config_dir) {
            tracing::warn!(error = %e, "failed to persist registry last-used");
        }

        let worktree = match self.worktrees.create(&repo_path, display_number).await {
            Ok(worktree) => worktree,
            Err(e) => {
                let reason = format!("Failed to create worktree: {e}");
                tracing::error!(display_number, %reason, "aborting task");
                self.report(
                    StatusUpdate::new(display_number, ExecutionStatus::Failed)
                        .with_error(reason)
                        .with_event(self.event(LifecycleEventKind::Failed)),
                )
                .await;
                let _ = self.state.lock().remove_running(display_number);
                self.write_status(true);
                return;
            }
        };

        // Same check again after the worktree work: a drain here owns the
        // report, we own putting the directory back.
        if !self.state.lock().is_running(display_number) {
            let _ = self.worktrees.remove(&worktree.path).await;
            return;
        }

        self.report(
            StatusUpdate::new(display_number, ExecutionStatus::Running)
                .with_event(self.event(LifecycleEventKind::Started)),
        )
        .await;
        self.write_status(true);

        let invocation = AgentInvocation {
            program: self.config.agent_program.clone(),
            prompt: build_prompt(&task.content, self.config.auto_commit),
            allowed_tools: self.config.allowed_tools.clone(),
            json_output: self.config.json_output,
            cwd: worktree.path.clone(),
            env: vec![
                ("PUSH_TASK_ID".to_string(), task.task_id.clone()),
                ("PUSH_DISPLAY_NUMBER".to_string(), display_number.to_string()),
            ],
        };

        let handle = match self.deps.agents.spawn(invocation).await {
            Ok(handle) => handle,
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(display_number, %reason, "agent spawn failed");
                self.report(
                    StatusUpdate::new(display_number, ExecutionStatus::Failed)
                        .with_error(reason)
                        .with_event(self.event(LifecycleEventKind::Failed)),
                )
                .await;
                let _ = self.state.lock().remove_running(display_number);
                let _ = self.worktrees.remove(&worktree.path).await;
                self.write_status(true);
                return;
            }
        };

        tracing::info!(display_number, pid = ?handle.pid, "agent started");
        let supervision =
            supervise(&self.state, display_number, handle, self.clock(), self.deps.notifier.as_ref())
                .await;

        self.finalize(&task, supervision).await;
    }

    /// Success/failure/timeout path after the agent exits. Whoever removes
    /// the running record owns reporting and cleanup; the drain path may
    /// have beaten us to it.
    async fn finalize(&self, task: &Task, supervision: Supervision) {
        let display_number = task.display_number;
        let Some(record) = self.state.lock().remove_running(display_number) else {
            return;
        };

        let now_ms = self.clock().epoch_ms();
        let duration_seconds = record.elapsed_secs(now_ms);
        let machine_name = self.deps.identity.machine_name.clone();

        let (update, outcome, pr_url) = if record.timed_out {
            let reason = format!(
                "Task timed out after {duration_seconds}s (limit: {}s)",
                self.config.task_timeout.as_secs()
            );
            tracing::warn!(display_number, %reason, "task timed out");
            (
                StatusUpdate::new(display_number, ExecutionStatus::Failed)
                    .with_error(reason)
                    .with_event(self.event(LifecycleEventKind::Failed)),
                Outcome::Timeout,
                None,
            )
        } else if supervision.exit.code == Some(0) {
            let pr_url = self.open_pull_request(task, &record).await;

            let mut summary = format!("Completed in {duration_seconds}s on {machine_name}");
            if let Some(ref url) = pr_url {
                summary.push_str(&format!(" · PR: {url}"));
            }

            let mut event = self
                .event(LifecycleEventKind::SessionFinished)
                .with_summary(summary.clone());
            if let Some(ref session_id) = supervision.session_id {
                event = event.with_session_id(session_id.clone());
            }

            let mut update = StatusUpdate::new(display_number, ExecutionStatus::SessionFinished)
                .with_summary(summary)
                .with_event(event);
            if let Some(ref session_id) = supervision.session_id {
                update = update.with_session_id(session_id.clone());
            }
            if let Some(ref url) = pr_url {
                update = update.with_pr_url(url.clone());
            }
            tracing::info!(display_number, duration_seconds, "task finished");
            (update, Outcome::SessionFinished, pr_url)
        } else {
            let code = supervision
                .exit
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let tail = stderr_tail(&supervision.exit.stderr_tail);
            let error = if tail.is_empty() {
                format!("Agent exited with code {code}")
            } else {
                format!("Agent exited with code {code}: {tail}")
            };
            tracing::warn!(display_number, %error, "task failed");
            (
                StatusUpdate::new(display_number, ExecutionStatus::Failed)
                    .with_error(error)
                    .with_event(self.event(LifecycleEventKind::Failed)),
                Outcome::Failed,
                None,
            )
        };

        self.report(update).await;

        {
            let mut state = self.state.lock();
            state.record_completion(CompletedRun {
                display_number,
                summary: record.summary.clone(),
                completed_at: rfc3339_from_epoch_ms(now_ms),
                duration_seconds,
                outcome,
                session_id: supervision.session_id,
                pr_url,
            });
        }

        if let Err(e) = self.worktrees.remove(&record.worktree_path).await {
            tracing::warn!(display_number, error = %e, "worktree cleanup failed");
        }
        self.write_status(true);
    }

    /// Graceful teardown: SIGTERM every child, report each running task as
    /// failed with a `daemon_shutdown` event, remove worktrees. The backend
    /// must never be left holding a `running` task for a dead daemon.
    pub async fn drain(&self) {
        let records: Vec<RunningTask> = {
            let mut state = self.state.lock();
            state.begin_drain();
            state
                .running_display_numbers()
                .into_iter()
                .filter_map(|d| state.remove_running(d))
                .collect()
        };

        if records.is_empty() {
            return;
        }
        tracing::info!(count = records.len(), "draining running tasks");

        // Kick off all terminations first so the grace periods overlap the
        // reporting below.
        let kills: Vec<_> = records
            .iter()
            .filter_map(|record| record.agent_pid)
            .map(|pid| tokio::spawn(terminate(pid, self.config.termination_grace)))
            .collect();

        for record in &records {
            self.report(
                StatusUpdate::new(record.display_number, ExecutionStatus::Failed)
                    .with_error("Daemon shut down while task was running".to_string())
                    .with_event(self.event(LifecycleEventKind::DaemonShutdown)),
            )
            .await;
            if let Err(e) = self.worktrees.remove(&record.worktree_path).await {
                tracing::warn!(
                    display_number = record.display_number,
                    error = %e,
                    "worktree cleanup failed during drain"
                );
            }
        }

        for kill in kills {
            let _ = kill.await;
        }
    }

    async fn open_pull_request(&self, task: &Task, record: &RunningTask) -> Option<String> {
        let title = if task.summary.trim().is_empty() {
            format!("Task #{}", task.display_number)
        } else {
            task.summary.trim().to_string()
        };
        let body = format!(
            "{}\n\nAutomated change for task #{} from {}.",
            task.content.trim(),
            task.display_number,
            self.deps.identity.machine_name
        );
        self.deps.pr_hook.open(&record.repo_path, &record.branch, &title, &body).await
    }

    /// Report a status update; failures are logged, never fatal. The run
    /// continues to clean up either way.
    pub(crate) async fn report(&self, update: StatusUpdate) {
        let display_number = update.display_number;
        let status = update.status;
        if let Err(e) = self.deps.backend.update_status(update).await {
            tracing::warn!(display_number, %status, error = %e, "status report failed");
        }
    }

    pub(crate) fn event(&self, kind: LifecycleEventKind) -> LifecycleEvent {
        LifecycleEvent::new(kind, self.clock().epoch_ms(), &self.deps.identity.machine_name)
    }
}

/// Last `STDERR_REPORT_CHARS` characters, on a char boundary.
fn stderr_tail(stderr: &str) -> String {
    let stderr = stderr.trim();
    let chars: Vec<char> = stderr.chars().collect();
    let start = chars.len().saturating_sub(STDERR_REPORT_CHARS);
    chars[start..].iter().collect()
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
