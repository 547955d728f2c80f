// SPDX-License-Identifier: MIT

//! The periodic tick: timeout sweep, idle sweep, poll, dispatch.

use crate::state::QueuedTask;
use crate::Engine;
use push_adapters::agent::terminate;
use push_adapters::decrypt_task_fields;
use push_core::{Clock, Task, IDLE_AFTER_SECS, IDLE_WARN_SECS};
use push_storage::ProjectRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default tick interval.
pub const TICK_INTERVAL: Duration = Duration::from_secs(30);

pub struct Scheduler<C: Clock> {
    engine: Arc<Engine<C>>,
    interval: Duration,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(engine: Arc<Engine<C>>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Tick immediately, then on the interval until cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            self.tick().await;
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => break,
            }
        }
    }

    /// One scheduler tick. Sweeps never block on the network; polling and
    /// dispatch happen only when there is capacity.
    pub async fn tick(&self) {
        self.sweep_timeouts();
        self.sweep_idle();
        self.poll_and_dispatch().await;
        self.engine.write_status(true);
    }

    /// Mark wall-clock-expired tasks and signal their agents. The run's
    /// finalizer observes `timed_out` and reports the timeout.
    fn sweep_timeouts(&self) {
        let engine = &self.engine;
        let now_ms = engine.clock().epoch_ms();
        let limit_secs = engine.config().task_timeout.as_secs();

        let mut expired = Vec::new();
        {
            let mut state = engine.state().lock();
            for display_number in state.running_display_numbers() {
                state.with_running_mut(display_number, |record| {
                    if !record.timed_out && record.elapsed_secs(now_ms) > limit_secs {
                        record.timed_out = true;
                        record.phase_detail =
                            Some(format!("timed out after {}s", record.elapsed_secs(now_ms)));
                        expired.push((display_number, record.agent_pid));
                    }
                });
            }
        }

        for (display_number, pid) in expired {
            tracing::warn!(display_number, limit_secs, "task exceeded wall-clock limit");
            if let Some(pid) = pid {
                tokio::spawn(terminate(pid, engine.config().termination_grace));
            }
        }
    }

    /// Surface silent tasks. Idle counts from the last output line, never
    /// from the start; idleness alone never kills a task.
    fn sweep_idle(&self) {
        let engine = &self.engine;
        let now_ms = engine.clock().epoch_ms();

        let mut newly_idle = Vec::new();
        {
            let mut state = engine.state().lock();
            for display_number in state.running_display_numbers() {
                state.with_running_mut(display_number, |record| {
                    let idle_secs = record.idle_secs(now_ms);
                    if idle_secs >= IDLE_AFTER_SECS {
                        if !record.idle_notified {
                            record.idle_notified = true;
                            newly_idle.push((display_number, idle_secs));
                        }
                    } else if idle_secs >= IDLE_WARN_SECS {
                        tracing::warn!(
                            display_number,
                            idle_secs,
                            "task quiet for over five minutes"
                        );
                    }
                });
            }
        }

        for (display_number, idle_secs) in newly_idle {
            tracing::warn!(display_number, idle_secs, "task is idle");
            self.engine.deps.notifier.notify(
                &format!("Task #{display_number} is idle"),
                &format!("No agent output for {} minutes", idle_secs / 60),
            );
        }
    }

    async fn poll_and_dispatch(&self) {
        let engine = &self.engine;
        let (running_count, draining) = {
            let state = engine.state().lock();
            (state.running_count(), state.is_draining())
        };
        if draining {
            return;
        }

        let cap = engine.config().max_concurrent;
        if running_count >= cap {
            tracing::debug!(running_count, cap, "at capacity, skipping poll");
            return;
        }

        let registry = match ProjectRegistry::load(&engine.config().config_dir) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(error = %e, "cannot load project registry, skipping poll");
                return;
            }
        };
        let repo_urls: Vec<String> =
            registry.repo_urls().into_iter().map(|u| u.to_string()).collect();

        let tasks = match engine.deps.backend.poll(&repo_urls).await {
            Ok(tasks) => tasks,
            Err(e) if e.is_auth() => {
                tracing::warn!(error = %e, "poll rejected; reconnect with `push connect`");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "poll failed");
                return;
            }
        };

        let mut candidates: Vec<Task> = {
            let state = engine.state().lock();
            tasks
                .into_iter()
                .filter(|task| task.is_queued() && !state.is_running(task.display_number))
                .collect()
        };
        for task in &mut candidates {
            decrypt_task_fields(task, engine.deps.decryptor.as_ref());
        }

        // Dispatch in backend order, up to the free slots this tick; the
        // overflow is only surfaced in the status snapshot.
        let slots = cap - running_count;
        let overflow = candidates.split_off(slots.min(candidates.len()));
        engine.state().lock().set_queued(
            overflow
                .iter()
                .map(|task| QueuedTask {
                    display_number: task.display_number,
                    summary: task.summary.clone(),
                })
                .collect(),
        );

        for task in candidates {
            let engine = Arc::clone(&self.engine);
            tokio::spawn(async move {
                engine.execute_task(task).await;
            });
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
