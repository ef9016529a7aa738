// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon tables: lifecycle rows plus observability side tables.

use super::MaterializedState;
use chrono::Duration;
use stashhog_core::{
    DaemonError, DaemonId, DaemonJobAction, DaemonRecord, DaemonStatusRow, Event,
};

/// Window for error occurrence coalescing and the 24h status counters.
const COALESCE_WINDOW_HOURS: i64 = 24;

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::DaemonRegistered { daemon } => {
            state.daemons.entry(daemon.id).or_insert_with(|| daemon.clone());
        }

        Event::DaemonConfigUpdated { id, configuration, enabled, auto_start, updated_at } => {
            if let Some(daemon) = state.daemons.get_mut(id) {
                if let Some(cfg) = configuration {
                    daemon.configuration = cfg.clone();
                }
                if let Some(e) = enabled {
                    daemon.enabled = *e;
                }
                if let Some(a) = auto_start {
                    daemon.auto_start = *a;
                }
                daemon.updated_at = *updated_at;
            }
        }

        Event::DaemonStatusChanged { id, status, started_at, updated_at } => {
            if let Some(daemon) = state.daemons.get_mut(id) {
                daemon.status = *status;
                daemon.started_at = *started_at;
                daemon.updated_at = *updated_at;
            }
        }

        Event::DaemonLogAppended { log } => {
            state.daemon_logs.push(log.clone());
        }

        Event::DaemonJobTracked { entry } => {
            state.daemon_job_history.push(entry.clone());
            if entry.action == DaemonJobAction::Launched {
                let window = Duration::hours(COALESCE_WINDOW_HOURS);
                let since = entry.created_at - window;
                let launched = state
                    .daemon_job_history
                    .iter()
                    .filter(|h| {
                        h.daemon_id == entry.daemon_id
                            && h.action == DaemonJobAction::Launched
                            && h.created_at >= since
                    })
                    .count() as u32;
                let row = status_row(state, entry.daemon_id, entry.created_at);
                row.jobs_launched_24h = launched;
                row.updated_at = entry.created_at;
            }
        }

        Event::DaemonErrorRecorded { daemon_id, error_type, message, details, context, at } => {
            let window = Duration::hours(COALESCE_WINDOW_HOURS);
            let existing = state.daemon_errors.iter().position(|e| {
                e.daemon_id == *daemon_id
                    && e.error_type == *error_type
                    && e.message == *message
                    && *at - e.last_seen <= window
            });
            match existing {
                Some(idx) => {
                    let error = &mut state.daemon_errors[idx];
                    error.occurrence_count += 1;
                    error.last_seen = *at;
                    if details.is_some() {
                        error.details = details.clone();
                    }
                }
                None => state.daemon_errors.push(DaemonError {
                    daemon_id: *daemon_id,
                    error_type: *error_type,
                    message: message.clone(),
                    details: details.clone(),
                    context: context.clone(),
                    occurrence_count: 1,
                    first_seen: *at,
                    last_seen: *at,
                }),
            }

            let since = *at - window;
            let errors = state
                .daemon_errors
                .iter()
                .filter(|e| e.daemon_id == *daemon_id && e.last_seen >= since)
                .map(|e| e.occurrence_count)
                .sum();
            let row = status_row(state, *daemon_id, *at);
            row.last_error_message = Some(message.clone());
            row.last_error_time = Some(*at);
            row.error_count_24h = errors;
            row.updated_at = *at;
        }

        Event::DaemonActivityRecorded { activity } => {
            state.daemon_activities.push(activity.clone());
        }

        Event::DaemonMetricRecorded { metric } => {
            state.daemon_metrics.push(metric.clone());
        }

        Event::DaemonProgressUpdated {
            daemon_id,
            current_activity,
            progress,
            items_processed,
            items_pending,
            at,
        } => {
            let row = status_row(state, *daemon_id, *at);
            if current_activity.is_some() {
                row.current_activity = current_activity.clone();
            }
            if progress.is_some() {
                row.current_progress = *progress;
            }
            if let Some(p) = items_processed {
                row.items_processed = *p;
            }
            if let Some(p) = items_pending {
                row.items_pending = *p;
            }
            row.updated_at = *at;
        }

        _ => {}
    }
}

fn status_row(
    state: &mut MaterializedState,
    daemon_id: DaemonId,
    at: chrono::DateTime<chrono::Utc>,
) -> &mut DaemonStatusRow {
    state.daemon_status.entry(daemon_id).or_insert_with(|| DaemonStatusRow::new(daemon_id, at))
}

impl MaterializedState {
    pub fn daemon(&self, id: &DaemonId) -> Option<&DaemonRecord> {
        self.daemons.get(id)
    }

    pub fn daemon_by_name(&self, name: &str) -> Option<&DaemonRecord> {
        self.daemons.values().find(|d| d.name == name)
    }

    /// All daemon rows sorted by name.
    pub fn daemons_sorted(&self) -> Vec<&DaemonRecord> {
        let mut rows: Vec<&DaemonRecord> = self.daemons.values().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }
}
