// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built from WAL replay.
//!
//! Each map below corresponds to one table of the persistent layout; the
//! in-memory query paths stand in for the table indexes. Every event is
//! applied exactly once: either directly after its WAL append or once
//! during startup replay.

mod daemons;
mod jobs;
mod plans;
mod sync;

use serde::{Deserialize, Serialize};
use stashhog_core::{
    AnalysisPlan, DaemonActivity, DaemonAlert, DaemonError, DaemonId, DaemonJobHistory, DaemonLog,
    DaemonMetric, DaemonRecord, DaemonStatusRow, Event, Job, JobId, PlanChange, SyncHistory,
};
use std::collections::{BTreeMap, HashMap};

/// State derived by folding events.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<JobId, Job>,
    pub plans: BTreeMap<i64, AnalysisPlan>,
    /// Changes keyed by id; iteration order is insertion order.
    pub changes: BTreeMap<i64, PlanChange>,
    pub daemons: HashMap<DaemonId, DaemonRecord>,
    pub daemon_logs: Vec<DaemonLog>,
    pub daemon_job_history: Vec<DaemonJobHistory>,
    pub daemon_errors: Vec<DaemonError>,
    pub daemon_activities: Vec<DaemonActivity>,
    pub daemon_metrics: Vec<DaemonMetric>,
    pub daemon_alerts: Vec<DaemonAlert>,
    pub daemon_status: HashMap<DaemonId, DaemonStatusRow>,
    pub sync_history: Vec<SyncHistory>,
    /// Next monotonic plan id; advanced by `plan:created`.
    pub next_plan_id: i64,
    /// Next monotonic change id; advanced by `plan:changes`.
    pub next_change_id: i64,
}

impl MaterializedState {
    /// Fold one event into the state.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobCreated { .. }
            | Event::JobStatusChanged { .. }
            | Event::JobMetaSet { .. }
            | Event::JobsPruned { .. } => jobs::apply(self, event),

            Event::PlanCreated { .. }
            | Event::PlanChangesAppended { .. }
            | Event::PlanMetadataMerged { .. }
            | Event::PlanStatusChanged { .. }
            | Event::ChangeStatusChanged { .. } => plans::apply(self, event),

            Event::DaemonRegistered { .. }
            | Event::DaemonConfigUpdated { .. }
            | Event::DaemonStatusChanged { .. }
            | Event::DaemonLogAppended { .. }
            | Event::DaemonJobTracked { .. }
            | Event::DaemonErrorRecorded { .. }
            | Event::DaemonActivityRecorded { .. }
            | Event::DaemonMetricRecorded { .. }
            | Event::DaemonProgressUpdated { .. } => daemons::apply(self, event),

            Event::SyncStarted { .. } | Event::SyncFinished { .. } => sync::apply(self, event),
        }
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
