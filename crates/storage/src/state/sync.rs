// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync-history table: append-only audit rows.

use super::MaterializedState;
use chrono::{DateTime, Utc};
use stashhog_core::{Event, SyncEntityType, SyncHistory, SyncRunStatus};

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::SyncStarted { entry } => {
            state.sync_history.push(entry.clone());
        }

        Event::SyncFinished { id, status, completed_at, counters, error_details } => {
            if let Some(entry) = state.sync_history.iter_mut().find(|s| s.id == *id) {
                entry.status = *status;
                entry.completed_at = Some(*completed_at);
                entry.counters = *counters;
                entry.error_details = error_details.clone();
            }
        }

        _ => {}
    }
}

impl MaterializedState {
    /// Most recent successful sync completion for an entity type.
    pub fn last_sync(&self, entity_type: SyncEntityType) -> Option<DateTime<Utc>> {
        self.sync_history
            .iter()
            .filter(|s| s.entity_type == entity_type && s.status == SyncRunStatus::Completed)
            .filter_map(|s| s.completed_at)
            .max()
    }

    /// Sync rows newest-first, optionally filtered by entity type.
    pub fn sync_history_sorted(&self, entity_type: Option<SyncEntityType>) -> Vec<&SyncHistory> {
        let mut rows: Vec<&SyncHistory> = self
            .sync_history
            .iter()
            .filter(|s| entity_type.is_none_or(|e| s.entity_type == e))
            .collect();
        rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        rows
    }
}
