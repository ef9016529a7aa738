// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon contract and the facilities every daemon gets.

use async_trait::async_trait;
use stashhog_core::{
    ActivityType, DaemonId, DaemonJobAction, DaemonKind, ErrorType, Job, JobId, JobParams,
    JobType, JsonMap, LogLevel, Notification,
};
use stashhog_engine::{EventBus, JobError, JobService};
use stashhog_storage::{Store, StoreError};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Errors from daemon lifecycle operations.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("{0}")]
    Runtime(String),
}

/// A long-lived control loop hosted by the supervisor.
///
/// `run` must return promptly once the context is cancelled, must refresh
/// the heartbeat periodically, and should log-and-continue on recoverable
/// errors rather than exiting.
#[async_trait]
pub trait Daemon: Send + Sync {
    fn kind(&self) -> DaemonKind;

    /// Initialize resources before the loop starts.
    async fn on_start(&self, _ctx: &DaemonContext) -> Result<(), DaemonError> {
        Ok(())
    }

    /// The loop body.
    async fn run(&self, ctx: &DaemonContext) -> Result<(), DaemonError>;

    /// Release resources after the loop exits.
    async fn on_stop(&self, _ctx: &DaemonContext) {}
}

/// Per-daemon facilities: persistence, broadcasting, and job launching.
///
/// Recording methods are infallible: a daemon must not die
/// because an observability row failed to write; failures are logged and
/// swallowed.
#[derive(Clone)]
pub struct DaemonContext {
    daemon_id: DaemonId,
    pub config: JsonMap,
    store: Store,
    bus: EventBus,
    jobs: JobService,
    cancel: CancellationToken,
}

impl DaemonContext {
    pub fn new(
        daemon_id: DaemonId,
        config: JsonMap,
        store: Store,
        bus: EventBus,
        jobs: JobService,
        cancel: CancellationToken,
    ) -> Self {
        Self { daemon_id, config, store, bus, jobs, cancel }
    }

    pub fn daemon_id(&self) -> DaemonId {
        self.daemon_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Sleep unless cancelled first; returns false when cancelled.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancel.cancelled() => false,
        }
    }

    /// Read a numeric configuration value with a default.
    pub fn config_u64(&self, key: &str, default: u64) -> u64 {
        self.config.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
    }

    /// Persist a log row and broadcast it.
    pub async fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(daemon_id = %self.daemon_id, "{message}"),
            LogLevel::Info => tracing::info!(daemon_id = %self.daemon_id, "{message}"),
            LogLevel::Warning => tracing::warn!(daemon_id = %self.daemon_id, "{message}"),
            LogLevel::Error => tracing::error!(daemon_id = %self.daemon_id, "{message}"),
        }
        match self.store.append_daemon_log(self.daemon_id, level, message) {
            Ok(log) => self.bus.publish(&Notification::DaemonLog {
                daemon_id: log.daemon_id,
                level: log.level,
                message: log.message,
                created_at: log.created_at,
            }),
            Err(e) => warn!(daemon_id = %self.daemon_id, error = %e, "failed to persist daemon log"),
        }
    }

    /// Refresh the heartbeat timestamp.
    pub async fn update_heartbeat(&self) {
        self.store.touch_daemon_heartbeat(&self.daemon_id);
    }

    /// Record and broadcast a job action taken by this daemon.
    pub async fn track_job_action(
        &self,
        job_id: JobId,
        action: DaemonJobAction,
        reason: Option<&str>,
    ) {
        match self.store.track_daemon_job(self.daemon_id, job_id, action, reason) {
            Ok(entry) => self.bus.publish(&Notification::DaemonJobAction {
                daemon_id: entry.daemon_id,
                action: entry.action,
                job_id: entry.job_id,
                reason: entry.reason,
                created_at: entry.created_at,
            }),
            Err(e) => {
                warn!(daemon_id = %self.daemon_id, error = %e, "failed to track job action");
            }
        }
    }

    pub async fn track_activity(
        &self,
        activity_type: ActivityType,
        message: &str,
        details: JsonMap,
        severity: &str,
    ) {
        if let Err(e) = self.store.record_daemon_activity(
            self.daemon_id,
            activity_type,
            message,
            details,
            severity,
        ) {
            warn!(daemon_id = %self.daemon_id, error = %e, "failed to record activity");
        }
    }

    pub async fn track_error(
        &self,
        error_type: ErrorType,
        message: &str,
        details: Option<&str>,
        context: JsonMap,
    ) {
        if let Err(e) =
            self.store.record_daemon_error(self.daemon_id, error_type, message, details, context)
        {
            warn!(daemon_id = %self.daemon_id, error = %e, "failed to record error");
        }
    }

    pub async fn track_metric(&self, name: &str, value: f64, unit: Option<&str>) {
        if let Err(e) = self.store.record_daemon_metric(self.daemon_id, name, value, unit) {
            warn!(daemon_id = %self.daemon_id, error = %e, "failed to record metric");
        }
    }

    pub async fn update_progress(
        &self,
        current_activity: Option<&str>,
        progress: Option<f64>,
        items_processed: Option<u64>,
        items_pending: Option<u64>,
    ) {
        if let Err(e) = self.store.update_daemon_progress(
            self.daemon_id,
            current_activity,
            progress,
            items_processed,
            items_pending,
        ) {
            warn!(daemon_id = %self.daemon_id, error = %e, "failed to update progress");
        }
    }

    /// Create a job through the job service and record LAUNCHED.
    pub async fn launch_job(
        &self,
        kind: JobType,
        params: JobParams,
        metadata: JsonMap,
        reason: Option<&str>,
    ) -> Result<Job, DaemonError> {
        let job = self.jobs.create_job(kind, params, metadata).await?;
        self.track_job_action(job.id, DaemonJobAction::Launched, reason).await;
        Ok(job)
    }

    /// Current state of a job this daemon is watching.
    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.jobs.job(id)
    }
}
