// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for event application on the materialized state.

use super::MaterializedState;
use chrono::{Duration, Utc};
use stashhog_core::{
    ChangeStatus, DaemonKind, DaemonRecord, Event, Job, JobId, JobParams, JobStatus, JobType,
    JsonMap, PlanStatus,
};

mod daemons;
mod jobs;
mod plans;
mod sync;

fn fresh_job(kind: JobType) -> Job {
    Job::new(JobId::new(), kind, JobParams::Empty, JsonMap::new(), Utc::now())
}

fn state_with_job(kind: JobType) -> (MaterializedState, JobId) {
    let mut state = MaterializedState::default();
    let job = fresh_job(kind);
    let id = job.id;
    state.apply_event(&Event::JobCreated { job });
    (state, id)
}

fn status_event(id: JobId, status: JobStatus) -> Event {
    Event::JobStatusChanged {
        id,
        status,
        progress: None,
        processed_items: None,
        total_items: None,
        result: None,
        error: None,
        message: None,
        started_at: None,
        completed_at: None,
    }
}
