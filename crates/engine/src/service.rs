// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job service: the only valid way to run a typed job.
//!
//! Couples the store, the runner, and the bus; enforces per-type locks; and
//! adapts handler progress callbacks into store updates plus bus events.

use crate::bus::EventBus;
use crate::error::JobError;
use crate::locks::TypeLocks;
use crate::runner::{TaskOutcome, TaskRunner, TaskStatus};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use stashhog_core::{
    job_span, Job, JobId, JobParams, JobStatus, JobType, JsonMap, Notification, StatusUpdate,
};
use stashhog_storage::{JobFilter, Store};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

/// Error text recorded when a user cancels a job.
const CANCELLED_BY_USER: &str = "Cancelled by user";

/// A registered job implementation.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, ctx: JobContext) -> Result<JsonMap, JobError>;
}

/// Everything a handler receives for one execution.
pub struct JobContext {
    pub job_id: JobId,
    pub kind: JobType,
    pub params: JobParams,
    pub reporter: Reporter,
    pub cancel: CancellationToken,
}

impl JobContext {
    /// Cooperative checkpoint: `Err(Cancelled)` once the token is set.
    pub fn check_cancelled(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    }
}

/// Progress reporter bound to one job.
///
/// Writes progress/message to the store and publishes a `job_update`;
/// identical consecutive values are not re-emitted.
#[derive(Clone)]
pub struct Reporter {
    store: Store,
    bus: EventBus,
    job_id: JobId,
    last: Arc<Mutex<Option<(u8, Option<String>)>>>,
}

impl Reporter {
    pub(crate) fn new(store: Store, bus: EventBus, job_id: JobId) -> Self {
        Self { store, bus, job_id, last: Arc::new(Mutex::new(None)) }
    }

    /// Report percent complete plus an optional message.
    ///
    /// 100 is reserved for the terminal transition; in-flight reports are
    /// capped at 99 so a full progress bar always means a finished job.
    pub async fn set_progress(&self, pct: u8, message: Option<&str>) -> Result<(), JobError> {
        let pct = pct.min(99);
        {
            let mut last = self.last.lock();
            let next = (pct, message.map(str::to_string));
            if last.as_ref() == Some(&next) {
                return Ok(());
            }
            *last = Some(next);
        }

        let mut update = StatusUpdate::default().progress(pct);
        if let Some(message) = message {
            update = update.message(message);
        }
        let status = self.progress_status();
        if let Some(job) = self.store.update_job_status(&self.job_id, status, update)? {
            publish_job_update(&self.bus, &self.store, &job);
        }
        Ok(())
    }

    /// Progress reports keep CANCELLING visible instead of flipping the job
    /// back to RUNNING.
    fn progress_status(&self) -> JobStatus {
        match self.store.job(&self.job_id).map(|j| j.status) {
            Some(JobStatus::Cancelling) => JobStatus::Cancelling,
            _ => JobStatus::Running,
        }
    }

    /// Report item counters alongside the derived percentage.
    pub async fn set_counts(
        &self,
        processed: u64,
        total: u64,
        message: Option<&str>,
    ) -> Result<(), JobError> {
        let pct = if total == 0 { 0 } else { ((processed * 100) / total).min(99) as u8 };
        let mut update = StatusUpdate::default().progress(pct).counts(processed, total);
        if let Some(message) = message {
            update = update.message(message);
        }
        let status = self.progress_status();
        if let Some(job) = self.store.update_job_status(&self.job_id, status, update)? {
            publish_job_update(&self.bus, &self.store, &job);
        }
        Ok(())
    }
}

struct ServiceInner {
    store: Store,
    bus: EventBus,
    runner: TaskRunner,
    handlers: RwLock<HashMap<JobType, Arc<dyn JobHandler>>>,
    locks: TypeLocks,
}

/// Shared job-service handle.
#[derive(Clone)]
pub struct JobService {
    inner: Arc<ServiceInner>,
}

impl JobService {
    pub fn new(store: Store, bus: EventBus, runner: TaskRunner) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                store,
                bus,
                runner,
                handlers: RwLock::new(HashMap::new()),
                locks: TypeLocks::new(),
            }),
        }
    }

    /// Register the handler for a job type; a second registration replaces
    /// the first.
    pub fn register(&self, kind: JobType, handler: Arc<dyn JobHandler>) {
        info!(job_type = %kind, "registered job handler");
        self.inner.handlers.write().insert(kind, handler);
    }

    pub fn store(&self) -> Store {
        self.inner.store.clone()
    }

    pub fn bus(&self) -> EventBus {
        self.inner.bus.clone()
    }

    /// Create a job row and queue its execution.
    ///
    /// A type with no registered handler yields a FAILED row and a
    /// validation error.
    pub async fn create_job(
        &self,
        kind: JobType,
        params: JobParams,
        metadata: JsonMap,
    ) -> Result<Job, JobError> {
        let handler = self.inner.handlers.read().get(&kind).cloned();
        let job = self.inner.store.create_job(kind, params.clone(), metadata)?;

        let Some(handler) = handler else {
            let message = format!("No handler registered for job type: {kind}");
            if let Some(row) = self.inner.store.update_job_status(
                &job.id,
                JobStatus::Failed,
                StatusUpdate::default().error(&message),
            )? {
                publish_job_update(&self.inner.bus, &self.inner.store, &row);
            }
            return Err(JobError::Validation(message));
        };

        let job_id = job.id;
        let inner = Arc::clone(&self.inner);
        let task_name = format!("{}_{}", kind.as_str(), job_id);
        let task_id = self.inner.runner.submit(&task_name, move |token| {
            run_job(inner, job_id, kind, params, handler, token)
        })?;
        self.inner.store.set_job_task_id(&job_id, &task_id.as_string())?;

        let created = self.inner.store.job(&job_id).unwrap_or(job);
        publish_job_update(&self.inner.bus, &self.inner.store, &created);
        info!(job_id = %job_id, job_type = %kind, "created job");
        Ok(created)
    }

    /// Request cancellation.
    ///
    /// PENDING jobs that never started are finalized immediately; RUNNING
    /// jobs move to CANCELLING until the handler observes the token. Returns
    /// false for unknown or already terminal jobs.
    pub async fn cancel_job(&self, id: &JobId) -> Result<bool, JobError> {
        let Some(job) = self.inner.store.job(id) else {
            return Ok(false);
        };
        if job.is_terminal() {
            return Ok(false);
        }

        let task_id = job.task_id().and_then(|raw| stashhog_core::TaskId::parse(raw).ok());
        match job.status {
            JobStatus::Pending => {
                let was_queued = match task_id {
                    Some(task_id) => self.inner.runner.cancel(&task_id),
                    None => None,
                };
                match was_queued {
                    // Never picked up by a worker: finalize here, the
                    // handler will never be invoked.
                    Some(TaskStatus::Pending) | None => {
                        record_cancelled(&self.inner, id);
                    }
                    // Task is executing the lock wait; its select observes
                    // the token and records the terminal state.
                    _ => {}
                }
                Ok(true)
            }
            JobStatus::Running | JobStatus::Cancelling => {
                if let Some(task_id) = task_id {
                    self.inner.runner.cancel(&task_id);
                }
                if let Some(row) = self.inner.store.update_job_status(
                    id,
                    JobStatus::Cancelling,
                    StatusUpdate::default(),
                )? {
                    publish_job_update(&self.inner.bus, &self.inner.store, &row);
                }
                info!(job_id = %id, "cancellation requested");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.inner.store.job(id)
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        self.inner.store.list_jobs(filter)
    }

    pub fn active_jobs(&self, kind: Option<JobType>) -> Vec<Job> {
        self.inner.store.active_jobs(kind)
    }

    /// Drain the runner; in-flight handlers observe their tokens.
    pub async fn shutdown(&self) {
        self.inner.runner.stop().await;
    }
}

/// The handler wrapper: lock acquisition, status transitions, terminal
/// recording. Runs on a pool worker.
async fn run_job(
    inner: Arc<ServiceInner>,
    job_id: JobId,
    kind: JobType,
    params: JobParams,
    handler: Arc<dyn JobHandler>,
    token: CancellationToken,
) -> TaskOutcome {
    // Per-type mutual exclusion. The wait is cancellable: a cancel while
    // queued behind the lock finalizes the job without running the handler.
    let _guard = match kind.lock_key() {
        Some(key) => {
            let lock = inner.locks.handle(key);
            match Arc::clone(&lock).try_lock_owned() {
                Ok(guard) => Some(guard),
                Err(_) => {
                    let waiting =
                        format!("Waiting for another {} job to complete", kind.as_str());
                    set_status(&inner, &job_id, JobStatus::Pending, StatusUpdate::default().message(waiting));
                    tokio::select! {
                        guard = lock.lock_owned() => Some(guard),
                        _ = token.cancelled() => {
                            record_cancelled(&inner, &job_id);
                            return TaskOutcome::Cancelled;
                        }
                    }
                }
            }
        }
        None => None,
    };

    if token.is_cancelled() {
        record_cancelled(&inner, &job_id);
        return TaskOutcome::Cancelled;
    }

    set_status(
        &inner,
        &job_id,
        JobStatus::Running,
        StatusUpdate::default().message("Job started"),
    );

    let reporter = Reporter::new(inner.store.clone(), inner.bus.clone(), job_id);
    let ctx = JobContext { job_id, kind, params, reporter, cancel: token.clone() };
    let span = job_span(job_id, kind, None);
    let result = handler.run(ctx).instrument(span).await;

    match result {
        Ok(result_map) => {
            set_status(
                &inner,
                &job_id,
                JobStatus::Completed,
                StatusUpdate::default()
                    .progress(100)
                    .result(result_map)
                    .message("Job completed successfully"),
            );
            TaskOutcome::Completed
        }
        Err(JobError::Cancelled) => {
            record_cancelled(&inner, &job_id);
            TaskOutcome::Cancelled
        }
        Err(e) => {
            error!(job_id = %job_id, error = %e, "job failed");
            set_status(
                &inner,
                &job_id,
                JobStatus::Failed,
                StatusUpdate::default()
                    .error(e.to_string())
                    .message(format!("Job failed: {e}")),
            );
            TaskOutcome::Failed
        }
    }
}

fn set_status(inner: &ServiceInner, job_id: &JobId, status: JobStatus, update: StatusUpdate) {
    match inner.store.update_job_status(job_id, status, update) {
        Ok(Some(job)) => publish_job_update(&inner.bus, &inner.store, &job),
        Ok(None) => {}
        Err(e) => error!(job_id = %job_id, error = %e, "failed to persist job status"),
    }
}

fn record_cancelled(inner: &ServiceInner, job_id: &JobId) {
    set_status(
        inner,
        job_id,
        JobStatus::Cancelled,
        StatusUpdate::default().error(CANCELLED_BY_USER),
    );
}

fn publish_job_update(bus: &EventBus, store: &Store, job: &Job) {
    bus.publish(&Notification::JobUpdate {
        job_id: job.id,
        timestamp: store.clock().utc_now(),
        status: job.status,
        progress: job.progress,
        message: job.last_message().map(str::to_string),
        result: job.result.clone(),
        error: job.error.clone(),
    });
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
