// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification payloads pushed to event-bus subscribers.

use crate::daemon::{DaemonJobAction, LogLevel};
use crate::id::{DaemonId, JobId};
use crate::job::JobStatus;
use crate::JsonMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A subscription topic: one job or one daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Job(JobId),
    Daemon(DaemonId),
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Job(id) => write!(f, "job:{id}"),
            Topic::Daemon(id) => write!(f, "daemon:{id}"),
        }
    }
}

/// Real-time update delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    JobUpdate {
        job_id: JobId,
        timestamp: DateTime<Utc>,
        status: JobStatus,
        progress: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<JsonMap>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    DaemonLog {
        daemon_id: DaemonId,
        level: LogLevel,
        message: String,
        created_at: DateTime<Utc>,
    },

    DaemonJobAction {
        daemon_id: DaemonId,
        action: DaemonJobAction,
        job_id: JobId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        created_at: DateTime<Utc>,
    },
}

impl Notification {
    /// The topic this notification belongs to.
    pub fn topic(&self) -> Topic {
        match self {
            Notification::JobUpdate { job_id, .. } => Topic::Job(*job_id),
            Notification::DaemonLog { daemon_id, .. }
            | Notification::DaemonJobAction { daemon_id, .. } => Topic::Daemon(*daemon_id),
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
