// SPDX-License-Identifier: MIT

//! Assembly of the status snapshot from engine state.

use crate::Engine;
use push_core::{rfc3339_from_epoch_ms, Clock, RunningTask};
use push_storage::status::COMPLETED_SNAPSHOT_LIMIT;
use push_storage::{DaemonInfo, StatusSnapshot, StatusStats, TaskStatusEntry};

impl<C: Clock> Engine<C> {
    /// Build a consistent snapshot of the engine's current state.
    pub fn snapshot(&self, running: bool) -> StatusSnapshot {
        let now_ms = self.clock().epoch_ms();
        let state = self.state.lock();

        let mut running_tasks: Vec<TaskStatusEntry> =
            state.running_records().map(|record| running_entry(record, now_ms)).collect();
        running_tasks.sort_by_key(|entry| entry.display_number);

        let queued_tasks: Vec<TaskStatusEntry> = state
            .queued()
            .iter()
            .map(|task| TaskStatusEntry {
                display_number: task.display_number,
                summary: task.summary.clone(),
                status: "queued".to_string(),
                phase: None,
                detail: None,
                started_at: None,
                elapsed_seconds: None,
            })
            .collect();

        let mut active_tasks = running_tasks.clone();
        active_tasks.extend(queued_tasks.iter().cloned());

        let completed = state.completed();
        let completed_today: Vec<_> = completed
            .iter()
            .skip(completed.len().saturating_sub(COMPLETED_SNAPSHOT_LIMIT))
            .cloned()
            .collect();

        StatusSnapshot {
            daemon: DaemonInfo {
                pid: self.pid,
                version: self.config.version.clone(),
                started_at: rfc3339_from_epoch_ms(self.started_at_ms),
                machine_name: self.deps.identity.machine_name.clone(),
                machine_id_suffix: self.deps.identity.suffix().to_string(),
            },
            running,
            active_tasks,
            running_tasks,
            queued_tasks,
            completed_today,
            stats: StatusStats {
                running: state.running_count(),
                max_concurrent: self.config.max_concurrent,
                completed_today: completed.len(),
            },
            updated_at: rfc3339_from_epoch_ms(now_ms),
            stopped_at: if running { None } else { Some(rfc3339_from_epoch_ms(now_ms)) },
        }
    }

    /// Rewrite the status file. Failures are logged; observability must
    /// never take down execution.
    pub fn write_status(&self, running: bool) {
        let snapshot = self.snapshot(running);
        if let Err(e) = snapshot.write(&self.config.state_dir) {
            tracing::warn!(error = %e, "failed to write status snapshot");
        }
    }
}

fn running_entry(record: &RunningTask, now_ms: u64) -> TaskStatusEntry {
    TaskStatusEntry {
        display_number: record.display_number,
        summary: record.summary.clone(),
        status: "running".to_string(),
        phase: Some(record.phase.as_str().to_string()),
        detail: record.phase_detail.clone(),
        started_at: Some(rfc3339_from_epoch_ms(record.started_at_ms)),
        elapsed_seconds: Some(record.elapsed_secs(now_ms)),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
