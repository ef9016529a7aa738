// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-daemon observability rows: errors, activities, metrics, alerts, and
//! the in-place status summary.

use crate::id::DaemonId;
use crate::JsonMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad classification of a daemon error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorType {
    Connection,
    Processing,
    Configuration,
    Unknown,
}

crate::simple_display! {
    ErrorType {
        Connection => "CONNECTION",
        Processing => "PROCESSING",
        Configuration => "CONFIGURATION",
        Unknown => "UNKNOWN",
    }
}

/// What a tracked activity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityType {
    JobLaunched,
    JobCompleted,
    JobFailed,
    ErrorOccurred,
    StatusChanged,
    ProcessingStarted,
    ProcessingCompleted,
}

crate::simple_display! {
    ActivityType {
        JobLaunched => "JOB_LAUNCHED",
        JobCompleted => "JOB_COMPLETED",
        JobFailed => "JOB_FAILED",
        ErrorOccurred => "ERROR_OCCURRED",
        StatusChanged => "STATUS_CHANGED",
        ProcessingStarted => "PROCESSING_STARTED",
        ProcessingCompleted => "PROCESSING_COMPLETED",
    }
}

/// Daemon error row with occurrence coalescing.
///
/// The same (daemon, error_type, message) within 24 hours increments
/// `occurrence_count` instead of inserting a new row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonError {
    pub daemon_id: DaemonId,
    pub error_type: ErrorType,
    pub message: String,
    /// Backtrace or detailed error text.
    pub details: Option<String>,
    /// What was being processed when the error occurred.
    #[serde(default)]
    pub context: JsonMap,
    pub occurrence_count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Daemon activity row for real-time monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonActivity {
    pub daemon_id: DaemonId,
    pub activity_type: ActivityType,
    pub message: String,
    #[serde(default)]
    pub details: JsonMap,
    /// "info", "warning", or "error".
    pub severity: String,
    pub created_at: DateTime<Utc>,
}

/// One daemon metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonMetric {
    pub daemon_id: DaemonId,
    pub name: String,
    pub value: f64,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Alert configuration/trigger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonAlert {
    pub daemon_id: DaemonId,
    pub alert_type: String,
    pub threshold_value: Option<f64>,
    pub enabled: bool,
    pub last_triggered: Option<DateTime<Utc>>,
    pub trigger_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Current daemon status summary, one row per daemon, updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonStatusRow {
    pub daemon_id: DaemonId,
    pub current_activity: Option<String>,
    /// Progress percentage (0–100) of the current activity.
    pub current_progress: Option<f64>,
    pub items_processed: u64,
    pub items_pending: u64,
    pub last_error_message: Option<String>,
    pub last_error_time: Option<DateTime<Utc>>,
    pub error_count_24h: u32,
    pub jobs_launched_24h: u32,
    pub health_score: f64,
    pub updated_at: DateTime<Utc>,
}

impl DaemonStatusRow {
    pub fn new(daemon_id: DaemonId, at: DateTime<Utc>) -> Self {
        Self {
            daemon_id,
            current_activity: None,
            current_progress: None,
            items_processed: 0,
            items_pending: 0,
            last_error_message: None,
            last_error_time: None,
            error_count_24h: 0,
            jobs_launched_24h: 0,
            health_score: 100.0,
            updated_at: at,
        }
    }
}
