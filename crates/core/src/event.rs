// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable mutation events.
//!
//! Every change to persisted state is one of these events, appended to the
//! write-ahead log before being applied to the materialized state. Replaying
//! the log from a snapshot reconstructs the state exactly; timestamps are
//! carried inside the events so replay never consults a clock.
//!
//! Serializes with `{"type": "area:name", ...fields}` format.

use crate::daemon::{DaemonJobHistory, DaemonLog, DaemonRecord, DaemonRunStatus};
use crate::id::{DaemonId, JobId, SyncId};
use crate::job::{Job, JobStatus};
use crate::observability::{DaemonActivity, DaemonMetric, ErrorType};
use crate::plan::{AnalysisPlan, ChangeStatus, PlanChange, PlanStatus};
use crate::sync::{SyncCounters, SyncHistory, SyncRunStatus};
use crate::JsonMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single durable state mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- job --
    #[serde(rename = "job:created")]
    JobCreated { job: Job },

    #[serde(rename = "job:status")]
    JobStatusChanged {
        id: JobId,
        status: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        processed_items: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_items: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<JsonMap>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        /// Set on the first transition to RUNNING.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        started_at: Option<DateTime<Utc>>,
        /// Set on any terminal transition.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        completed_at: Option<DateTime<Utc>>,
    },

    #[serde(rename = "job:meta")]
    JobMetaSet { id: JobId, key: String, value: serde_json::Value },

    #[serde(rename = "job:pruned")]
    JobsPruned { ids: Vec<JobId> },

    // -- plan --
    #[serde(rename = "plan:created")]
    PlanCreated { plan: AnalysisPlan },

    #[serde(rename = "plan:changes")]
    PlanChangesAppended { plan_id: i64, changes: Vec<PlanChange> },

    #[serde(rename = "plan:metadata")]
    PlanMetadataMerged { id: i64, entries: JsonMap },

    #[serde(rename = "plan:status")]
    PlanStatusChanged {
        id: i64,
        status: PlanStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        applied_at: Option<DateTime<Utc>>,
    },

    #[serde(rename = "change:status")]
    ChangeStatusChanged {
        id: i64,
        status: ChangeStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        applied_at: Option<DateTime<Utc>>,
    },

    // -- daemon --
    #[serde(rename = "daemon:registered")]
    DaemonRegistered { daemon: DaemonRecord },

    #[serde(rename = "daemon:config")]
    DaemonConfigUpdated {
        id: DaemonId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        configuration: Option<JsonMap>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auto_start: Option<bool>,
        updated_at: DateTime<Utc>,
    },

    #[serde(rename = "daemon:status")]
    DaemonStatusChanged {
        id: DaemonId,
        status: DaemonRunStatus,
        /// Absolute new value; `None` clears the field (stop).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        started_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    },

    #[serde(rename = "daemon:log")]
    DaemonLogAppended { log: DaemonLog },

    #[serde(rename = "daemon:job_action")]
    DaemonJobTracked { entry: DaemonJobHistory },

    #[serde(rename = "daemon:error")]
    DaemonErrorRecorded {
        daemon_id: DaemonId,
        error_type: ErrorType,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        #[serde(default, skip_serializing_if = "JsonMap::is_empty")]
        context: JsonMap,
        at: DateTime<Utc>,
    },

    #[serde(rename = "daemon:activity")]
    DaemonActivityRecorded { activity: DaemonActivity },

    #[serde(rename = "daemon:metric")]
    DaemonMetricRecorded { metric: DaemonMetric },

    #[serde(rename = "daemon:progress")]
    DaemonProgressUpdated {
        daemon_id: DaemonId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_activity: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items_processed: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items_pending: Option<u64>,
        at: DateTime<Utc>,
    },

    // -- sync --
    #[serde(rename = "sync:started")]
    SyncStarted { entry: SyncHistory },

    #[serde(rename = "sync:finished")]
    SyncFinished {
        id: SyncId,
        status: SyncRunStatus,
        completed_at: DateTime<Utc>,
        counters: SyncCounters,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_details: Option<serde_json::Value>,
    },
}

impl Event {
    /// Short name of the event ("job:status" style), for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Event::JobCreated { .. } => "job:created",
            Event::JobStatusChanged { .. } => "job:status",
            Event::JobMetaSet { .. } => "job:meta",
            Event::JobsPruned { .. } => "job:pruned",
            Event::PlanCreated { .. } => "plan:created",
            Event::PlanChangesAppended { .. } => "plan:changes",
            Event::PlanMetadataMerged { .. } => "plan:metadata",
            Event::PlanStatusChanged { .. } => "plan:status",
            Event::ChangeStatusChanged { .. } => "change:status",
            Event::DaemonRegistered { .. } => "daemon:registered",
            Event::DaemonConfigUpdated { .. } => "daemon:config",
            Event::DaemonStatusChanged { .. } => "daemon:status",
            Event::DaemonLogAppended { .. } => "daemon:log",
            Event::DaemonJobTracked { .. } => "daemon:job_action",
            Event::DaemonErrorRecorded { .. } => "daemon:error",
            Event::DaemonActivityRecorded { .. } => "daemon:activity",
            Event::DaemonMetricRecorded { .. } => "daemon:metric",
            Event::DaemonProgressUpdated { .. } => "daemon:progress",
            Event::SyncStarted { .. } => "sync:started",
            Event::SyncFinished { .. } => "sync:finished",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
