// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job table: apply functions and query paths.

use super::MaterializedState;
use stashhog_core::job::META_LAST_MESSAGE;
use stashhog_core::{Event, Job, JobId, JobStatus, JobType};

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobCreated { job } => {
            state.jobs.entry(job.id).or_insert_with(|| job.clone());
        }

        Event::JobStatusChanged {
            id,
            status,
            progress,
            processed_items,
            total_items,
            result,
            error,
            message,
            started_at,
            completed_at,
        } => {
            if let Some(job) = state.jobs.get_mut(id) {
                job.status = *status;
                if let Some(p) = progress {
                    job.progress = (*p).min(100);
                }
                if processed_items.is_some() {
                    job.processed_items = *processed_items;
                }
                if total_items.is_some() {
                    job.total_items = *total_items;
                }
                if let Some(r) = result {
                    job.result = Some(r.clone());
                }
                if let Some(e) = error {
                    job.error = Some(e.clone());
                }
                if let Some(m) = message {
                    job.metadata.insert(META_LAST_MESSAGE.to_string(), m.clone().into());
                }
                if started_at.is_some() {
                    job.started_at = *started_at;
                }
                if completed_at.is_some() {
                    job.completed_at = *completed_at;
                }
            }
        }

        Event::JobMetaSet { id, key, value } => {
            if let Some(job) = state.jobs.get_mut(id) {
                job.metadata.insert(key.clone(), value.clone());
            }
        }

        Event::JobsPruned { ids } => {
            for id in ids {
                state.jobs.remove(id);
            }
        }

        _ => {}
    }
}

impl MaterializedState {
    pub fn job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Jobs sorted newest-first, optionally filtered by status and type.
    pub fn jobs_sorted(
        &self,
        status: Option<JobStatus>,
        kind: Option<JobType>,
    ) -> Vec<&Job> {
        let mut rows: Vec<&Job> = self
            .jobs
            .values()
            .filter(|j| status.is_none_or(|s| j.status == s))
            .filter(|j| kind.is_none_or(|k| j.kind == k))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }

    /// Jobs in PENDING, RUNNING, or CANCELLING.
    pub fn active_jobs(&self, kind: Option<JobType>) -> Vec<&Job> {
        let mut rows: Vec<&Job> = self
            .jobs
            .values()
            .filter(|j| j.status.is_active())
            .filter(|j| kind.is_none_or(|k| j.kind == k))
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rows
    }
}
