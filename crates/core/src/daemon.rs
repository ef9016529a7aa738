// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon records: long-lived control loops with their own lifecycle rows.

use crate::id::{DaemonId, JobId};
use crate::JsonMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of daemon. Closed set; the supervisor's factory maps each kind to
/// its implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonKind {
    AutoStashSync,
    Test,
}

crate::simple_display! {
    DaemonKind {
        AutoStashSync => "auto_stash_sync",
        Test => "test",
    }
}

/// Lifecycle state of a daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DaemonRunStatus {
    Stopped,
    Running,
    Error,
}

crate::simple_display! {
    DaemonRunStatus {
        Stopped => "stopped",
        Running => "running",
        Error => "error",
    }
}

/// Severity of a daemon log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

crate::simple_display! {
    LogLevel {
        Debug => "DEBUG",
        Info => "INFO",
        Warning => "WARNING",
        Error => "ERROR",
    }
}

/// Action a daemon performed on a job it manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DaemonJobAction {
    Launched,
    Cancelled,
    Finished,
    Failed,
}

crate::simple_display! {
    DaemonJobAction {
        Launched => "LAUNCHED",
        Cancelled => "CANCELLED",
        Finished => "FINISHED",
        Failed => "FAILED",
    }
}

/// Persistent daemon row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonRecord {
    pub id: DaemonId,
    /// Unique human-readable name.
    pub name: String,
    pub kind: DaemonKind,
    /// Whether this daemon is expected to run (health accounting).
    pub enabled: bool,
    /// Whether the supervisor starts it at process startup.
    pub auto_start: bool,
    pub status: DaemonRunStatus,
    /// Opaque per-daemon configuration, read at start.
    #[serde(default)]
    pub configuration: JsonMap,
    pub started_at: Option<DateTime<Utc>>,
    /// Refreshed by the running loop; runtime-only signal, stale after restart.
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DaemonRecord {
    pub fn new(name: impl Into<String>, kind: DaemonKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: DaemonId::new(),
            name: name.into(),
            kind,
            enabled: true,
            auto_start: false,
            status: DaemonRunStatus::Stopped,
            configuration: JsonMap::new(),
            started_at: None,
            last_heartbeat: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Read a numeric configuration value with a default.
    pub fn config_u64(&self, key: &str, default: u64) -> u64 {
        self.configuration.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
    }
}

/// One daemon log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonLog {
    pub daemon_id: DaemonId,
    pub level: LogLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Audit row for a job action taken by a daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonJobHistory {
    pub daemon_id: DaemonId,
    pub job_id: JobId,
    pub action: DaemonJobAction,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
