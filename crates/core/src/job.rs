// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and status machine.

use crate::id::JobId;
use crate::job_type::JobType;
use crate::params::JobParams;
use crate::JsonMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a background job.
///
/// Created `Pending`, moved to `Running` when a worker picks it up, then to
/// exactly one terminal state. `Cancelling` is the transient state between a
/// cancel request on a running job and the handler winding down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelling,
    Cancelled,
}

impl JobStatus {
    /// Terminal states admit no further status transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Active states count toward "active jobs" queries.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running | JobStatus::Cancelling)
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelling => "cancelling",
        Cancelled => "cancelled",
    }
}

/// Metadata key holding the runner task handle for a job.
pub const META_TASK_ID: &str = "task_id";
/// Metadata key holding the most recent progress message.
pub const META_LAST_MESSAGE: &str = "last_message";

/// One unit of background work, tracked durably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "type")]
    pub kind: JobType,
    pub status: JobStatus,
    /// Percent complete, 0–100.
    pub progress: u8,
    pub total_items: Option<u64>,
    pub processed_items: Option<u64>,
    /// Typed parameters captured at creation; immutable afterwards.
    pub parameters: JobParams,
    /// Mutable scratch map (last_message, task_id, creator tags).
    #[serde(default)]
    pub metadata: JsonMap,
    /// Handler-defined result map, set only on success.
    pub result: Option<JsonMap>,
    /// Human-readable failure text, set only on failure or cancellation.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: JobId, kind: JobType, parameters: JobParams, metadata: JsonMap, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            status: JobStatus::Pending,
            progress: 0,
            total_items: None,
            processed_items: None,
            parameters,
            metadata,
            result: None,
            error: None,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn can_be_cancelled(&self) -> bool {
        matches!(self.status, JobStatus::Pending | JobStatus::Running)
    }

    /// Most recent progress message, if any.
    pub fn last_message(&self) -> Option<&str> {
        self.metadata.get(META_LAST_MESSAGE).and_then(|v| v.as_str())
    }

    /// Runner task handle recorded at submission, if any.
    pub fn task_id(&self) -> Option<&str> {
        self.metadata.get(META_TASK_ID).and_then(|v| v.as_str())
    }

    pub fn duration_seconds(&self, now: DateTime<Utc>) -> Option<f64> {
        let start = self.started_at?;
        let end = self.completed_at.unwrap_or(now);
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }
}

/// Fields accompanying a status transition.
///
/// Everything is optional; absent fields are left untouched on the row.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub progress: Option<u8>,
    pub processed_items: Option<u64>,
    pub total_items: Option<u64>,
    pub result: Option<JsonMap>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl StatusUpdate {
    pub fn progress(mut self, pct: u8) -> Self {
        self.progress = Some(pct.min(100));
        self
    }

    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn result(mut self, result: JsonMap) -> Self {
        self.result = Some(result);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn counts(mut self, processed: u64, total: u64) -> Self {
        self.processed_items = Some(processed);
        self.total_items = Some(total);
        self
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        set {
            kind: JobType = JobType::Test,
            status: JobStatus = JobStatus::Pending,
            progress: u8 = 0,
            parameters: JobParams = JobParams::Empty,
            metadata: JsonMap = JsonMap::new(),
        }
        option {
            total_items: u64 = None,
            processed_items: u64 = None,
            result: JsonMap = None,
            error: String = None,
            started_at: DateTime<Utc> = None,
            completed_at: DateTime<Utc> = None,
        }
        computed {
            id: JobId = JobId::new(),
            created_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
