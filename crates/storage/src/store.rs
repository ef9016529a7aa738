// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The typed store facade.
//!
//! Single write path for all persisted state: every mutation appends one
//! event to the WAL and folds it into the materialized state under one
//! mutex, which is also the ambient transaction boundary. Reads clone the
//! requested rows out of the state.

use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use stashhog_core::{
    ActivityType, AnalysisPlan, ChangeCounts, ChangeStatus, Clock, DaemonError, DaemonId,
    DaemonJobAction, DaemonJobHistory, DaemonKind, DaemonLog, DaemonRecord, DaemonStatusRow,
    ErrorType, Event, Job, JobId, JobStatus, JobType, JsonMap, LogLevel, NewChange, PlanChange,
    PlanStatus, StatusUpdate, SyncCounters, SyncEntityType, SyncHistory, SyncId, SyncRunStatus,
    DaemonActivity, DaemonMetric, JobParams,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("{0} not found")]
    NotFound(String),
}

/// Filter for job listings.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub kind: Option<JobType>,
    pub limit: Option<usize>,
    pub offset: usize,
}

struct Inner {
    state: MaterializedState,
    wal: Wal,
    snapshot_path: PathBuf,
    #[cfg(any(test, feature = "test-support"))]
    _scratch: Option<tempfile::TempDir>,
}

/// Durable state handle shared across the process.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Open the store: load the snapshot, replay the WAL tail, ready to serve.
    pub fn open(
        wal_path: &Path,
        snapshot_path: &Path,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let (mut state, snapshot_seq) = match Snapshot::load(snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(wal_path)?;
        let entries = wal.replay_after(snapshot_seq)?;
        let replayed = entries.len();
        for entry in entries {
            state.apply_event(&entry.event);
        }
        if replayed > 0 || snapshot_seq > 0 {
            tracing::info!(snapshot_seq, replayed, "store opened from snapshot + WAL replay");
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                wal,
                snapshot_path: snapshot_path.to_owned(),
                #[cfg(any(test, feature = "test-support"))]
                _scratch: None,
            })),
            clock,
        })
    }

    /// Open a store on a throwaway directory. The directory lives as long as
    /// the store.
    #[cfg(any(test, feature = "test-support"))]
    pub fn ephemeral(clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let scratch = tempfile::tempdir().map_err(WalError::Io)?;
        let store = Self::open(
            &scratch.path().join("events.wal"),
            &scratch.path().join("state.snapshot"),
            clock,
        )?;
        store.inner.lock()._scratch = Some(scratch);
        Ok(store)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Run a read-only closure against the materialized state.
    pub fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        f(&self.inner.lock().state)
    }

    /// Force buffered WAL entries to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.inner.lock().wal.flush()?;
        Ok(())
    }

    /// Flush if the group-commit window has closed.
    pub fn flush_if_due(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        Ok(())
    }

    /// Write a snapshot and truncate the WAL through it.
    ///
    /// Returns the checkpointed sequence number.
    pub fn checkpoint(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock();
        inner.wal.flush()?;
        let seq = inner.wal.last_seq();
        Snapshot::save(&inner.snapshot_path, seq, &inner.state)?;
        inner.wal.truncate_through(seq)?;
        Ok(seq)
    }

    fn commit(inner: &mut Inner, event: Event) -> Result<(), StoreError> {
        inner.wal.append(&event)?;
        inner.state.apply_event(&event);
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        Ok(())
    }

    // ---- jobs ----

    /// Insert a new PENDING job row.
    pub fn create_job(
        &self,
        kind: JobType,
        parameters: JobParams,
        metadata: JsonMap,
    ) -> Result<Job, StoreError> {
        let job = Job::new(JobId::new(), kind, parameters, metadata, self.clock.utc_now());
        let mut inner = self.inner.lock();
        Self::commit(&mut inner, Event::JobCreated { job: job.clone() })?;
        Ok(job)
    }

    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.inner.lock().state.job(id).cloned()
    }

    /// Transition a job's status and merge the accompanying fields.
    ///
    /// Stamps `started_at` on the first RUNNING transition and
    /// `completed_at` on any terminal transition. Once a job is terminal its
    /// status is frozen: further calls return the row unchanged.
    pub fn update_job_status(
        &self,
        id: &JobId,
        status: JobStatus,
        update: StatusUpdate,
    ) -> Result<Option<Job>, StoreError> {
        let mut inner = self.inner.lock();
        let Some(current) = inner.state.job(id).cloned() else {
            return Ok(None);
        };
        if current.status.is_terminal() {
            return Ok(Some(current));
        }

        let now = self.clock.utc_now();
        let started_at =
            (status == JobStatus::Running && current.started_at.is_none()).then_some(now);
        let completed_at =
            (status.is_terminal() && current.completed_at.is_none()).then_some(now);

        Self::commit(
            &mut inner,
            Event::JobStatusChanged {
                id: *id,
                status,
                progress: update.progress,
                processed_items: update.processed_items,
                total_items: update.total_items,
                result: update.result,
                error: update.error,
                message: update.message,
                started_at,
                completed_at,
            },
        )?;
        Ok(inner.state.job(id).cloned())
    }

    /// Record the runner task handle on the job row.
    pub fn set_job_task_id(&self, id: &JobId, task_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::commit(
            &mut inner,
            Event::JobMetaSet {
                id: *id,
                key: stashhog_core::job::META_TASK_ID.to_string(),
                value: task_id.into(),
            },
        )
    }

    /// Jobs sorted by `created_at` descending with limit/offset paging.
    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let inner = self.inner.lock();
        inner
            .state
            .jobs_sorted(filter.status, filter.kind)
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(50))
            .cloned()
            .collect()
    }

    /// Jobs in PENDING, RUNNING, or CANCELLING.
    pub fn active_jobs(&self, kind: Option<JobType>) -> Vec<Job> {
        self.inner.lock().state.active_jobs(kind).into_iter().cloned().collect()
    }

    /// Delete terminal jobs that completed before the cutoff. Returns the
    /// number of rows removed.
    pub fn cleanup_old_jobs(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();
        let ids: Vec<JobId> = inner
            .state
            .jobs
            .values()
            .filter(|j| j.is_terminal() && j.completed_at.is_some_and(|at| at < cutoff))
            .map(|j| j.id)
            .collect();
        let count = ids.len();
        if count > 0 {
            Self::commit(&mut inner, Event::JobsPruned { ids })?;
        }
        Ok(count)
    }

    /// Non-terminal jobs left behind by a previous process (or wedged in
    /// this one). Reported on startup; rewritten by the cleanup job.
    pub fn stale_jobs(&self) -> Vec<Job> {
        self.inner
            .lock()
            .state
            .jobs
            .values()
            .filter(|j| !j.is_terminal())
            .cloned()
            .collect()
    }

    /// Mark non-terminal jobs last touched before the cutoff as FAILED.
    pub fn fail_stale_jobs(&self, before: DateTime<Utc>) -> Result<usize, StoreError> {
        let ids: Vec<JobId> = {
            let inner = self.inner.lock();
            inner
                .state
                .jobs
                .values()
                .filter(|j| !j.is_terminal())
                .filter(|j| j.started_at.unwrap_or(j.created_at) < before)
                .map(|j| j.id)
                .collect()
        };
        let count = ids.len();
        for id in ids {
            self.update_job_status(
                &id,
                JobStatus::Failed,
                StatusUpdate::default().error("Job stale after restart"),
            )?;
        }
        Ok(count)
    }

    // ---- plans ----

    /// Insert a new plan in PENDING, assigning the next monotonic id.
    pub fn create_plan(
        &self,
        name: &str,
        description: Option<&str>,
        metadata: JsonMap,
        job_id: Option<JobId>,
    ) -> Result<AnalysisPlan, StoreError> {
        let mut inner = self.inner.lock();
        let plan = AnalysisPlan {
            id: inner.state.next_plan_id.max(1),
            name: name.to_string(),
            description: description.map(str::to_string),
            metadata,
            status: PlanStatus::Pending,
            job_id,
            created_at: self.clock.utc_now(),
            applied_at: None,
        };
        Self::commit(&mut inner, Event::PlanCreated { plan: plan.clone() })?;
        Ok(plan)
    }

    pub fn plan(&self, id: i64) -> Option<AnalysisPlan> {
        self.inner.lock().state.plan(id).cloned()
    }

    pub fn plans(&self, status: Option<PlanStatus>) -> Vec<AnalysisPlan> {
        self.inner.lock().state.plans_sorted(status).into_iter().cloned().collect()
    }

    /// Batch-insert changes into a plan, each starting PENDING.
    pub fn append_changes(
        &self,
        plan_id: i64,
        changes: Vec<NewChange>,
    ) -> Result<Vec<PlanChange>, StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.plan(plan_id).is_none() {
            return Err(StoreError::NotFound(format!("plan {plan_id}")));
        }
        let now = self.clock.utc_now();
        let start = inner.state.next_change_id.max(1);
        let rows: Vec<PlanChange> = changes
            .into_iter()
            .enumerate()
            .map(|(offset, change)| PlanChange {
                id: start + offset as i64,
                plan_id,
                scene_id: change.scene_id,
                field: change.field,
                action: change.action,
                current_value: change.current_value,
                proposed_value: change.proposed_value,
                confidence: change.confidence,
                status: ChangeStatus::Pending,
                applied: false,
                applied_at: None,
                created_at: now,
            })
            .collect();
        Self::commit(&mut inner, Event::PlanChangesAppended { plan_id, changes: rows.clone() })?;
        Ok(rows)
    }

    pub fn change(&self, id: i64) -> Option<PlanChange> {
        self.inner.lock().state.change(id).cloned()
    }

    pub fn plan_changes(&self, plan_id: i64) -> Vec<PlanChange> {
        self.inner.lock().state.plan_changes(plan_id).into_iter().cloned().collect()
    }

    pub fn change_counts(&self, plan_id: i64) -> ChangeCounts {
        self.inner.lock().state.change_counts(plan_id)
    }

    /// Set one change's status; `applied_at` is stamped when provided.
    pub fn set_change_status(
        &self,
        id: i64,
        status: ChangeStatus,
        applied_at: Option<DateTime<Utc>>,
    ) -> Result<PlanChange, StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.change(id).is_none() {
            return Err(StoreError::NotFound(format!("change {id}")));
        }
        Self::commit(&mut inner, Event::ChangeStatusChanged { id, status, applied_at })?;
        inner
            .state
            .change(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("change {id}")))
    }

    pub fn set_plan_status(
        &self,
        id: i64,
        status: PlanStatus,
        applied_at: Option<DateTime<Utc>>,
    ) -> Result<AnalysisPlan, StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.plan(id).is_none() {
            return Err(StoreError::NotFound(format!("plan {id}")));
        }
        Self::commit(&mut inner, Event::PlanStatusChanged { id, status, applied_at })?;
        inner
            .state
            .plan(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("plan {id}")))
    }

    pub fn merge_plan_metadata(&self, id: i64, entries: JsonMap) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.plan(id).is_none() {
            return Err(StoreError::NotFound(format!("plan {id}")));
        }
        Self::commit(&mut inner, Event::PlanMetadataMerged { id, entries })
    }

    // ---- daemons ----

    /// Register a daemon row by name, returning the existing row when the
    /// name is already taken.
    pub fn ensure_daemon(&self, name: &str, kind: DaemonKind) -> Result<DaemonRecord, StoreError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.state.daemon_by_name(name) {
            return Ok(existing.clone());
        }
        let record = DaemonRecord::new(name, kind, self.clock.utc_now());
        Self::commit(&mut inner, Event::DaemonRegistered { daemon: record.clone() })?;
        Ok(record)
    }

    pub fn daemon(&self, id: &DaemonId) -> Option<DaemonRecord> {
        self.inner.lock().state.daemon(id).cloned()
    }

    pub fn daemon_by_name(&self, name: &str) -> Option<DaemonRecord> {
        self.inner.lock().state.daemon_by_name(name).cloned()
    }

    pub fn daemons(&self) -> Vec<DaemonRecord> {
        self.inner.lock().state.daemons_sorted().into_iter().cloned().collect()
    }

    pub fn set_daemon_status(
        &self,
        id: &DaemonId,
        status: stashhog_core::DaemonRunStatus,
        started_at: Option<DateTime<Utc>>,
    ) -> Result<DaemonRecord, StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.daemon(id).is_none() {
            return Err(StoreError::NotFound(format!("daemon {id}")));
        }
        Self::commit(
            &mut inner,
            Event::DaemonStatusChanged {
                id: *id,
                status,
                started_at,
                updated_at: self.clock.utc_now(),
            },
        )?;
        inner
            .state
            .daemon(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("daemon {id}")))
    }

    pub fn update_daemon_config(
        &self,
        id: &DaemonId,
        configuration: Option<JsonMap>,
        enabled: Option<bool>,
        auto_start: Option<bool>,
    ) -> Result<DaemonRecord, StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.daemon(id).is_none() {
            return Err(StoreError::NotFound(format!("daemon {id}")));
        }
        Self::commit(
            &mut inner,
            Event::DaemonConfigUpdated {
                id: *id,
                configuration,
                enabled,
                auto_start,
                updated_at: self.clock.utc_now(),
            },
        )?;
        inner
            .state
            .daemon(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("daemon {id}")))
    }

    /// Refresh the heartbeat timestamp. Runtime-only: not written to the
    /// WAL, so it resets on restart.
    pub fn touch_daemon_heartbeat(&self, id: &DaemonId) {
        let mut inner = self.inner.lock();
        let now = self.clock.utc_now();
        if let Some(daemon) = inner.state.daemons.get_mut(id) {
            daemon.last_heartbeat = Some(now);
        }
    }

    pub fn append_daemon_log(
        &self,
        daemon_id: DaemonId,
        level: LogLevel,
        message: &str,
    ) -> Result<DaemonLog, StoreError> {
        let log = DaemonLog {
            daemon_id,
            level,
            message: message.to_string(),
            created_at: self.clock.utc_now(),
        };
        let mut inner = self.inner.lock();
        Self::commit(&mut inner, Event::DaemonLogAppended { log: log.clone() })?;
        Ok(log)
    }

    pub fn daemon_logs(&self, daemon_id: &DaemonId, limit: usize) -> Vec<DaemonLog> {
        let inner = self.inner.lock();
        inner
            .state
            .daemon_logs
            .iter()
            .rev()
            .filter(|l| l.daemon_id == *daemon_id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn track_daemon_job(
        &self,
        daemon_id: DaemonId,
        job_id: JobId,
        action: DaemonJobAction,
        reason: Option<&str>,
    ) -> Result<DaemonJobHistory, StoreError> {
        let entry = DaemonJobHistory {
            daemon_id,
            job_id,
            action,
            reason: reason.map(str::to_string),
            created_at: self.clock.utc_now(),
        };
        let mut inner = self.inner.lock();
        Self::commit(&mut inner, Event::DaemonJobTracked { entry: entry.clone() })?;
        Ok(entry)
    }

    pub fn daemon_job_history(&self, daemon_id: &DaemonId, limit: usize) -> Vec<DaemonJobHistory> {
        let inner = self.inner.lock();
        inner
            .state
            .daemon_job_history
            .iter()
            .rev()
            .filter(|h| h.daemon_id == *daemon_id)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn record_daemon_error(
        &self,
        daemon_id: DaemonId,
        error_type: ErrorType,
        message: &str,
        details: Option<&str>,
        context: JsonMap,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::commit(
            &mut inner,
            Event::DaemonErrorRecorded {
                daemon_id,
                error_type,
                message: message.to_string(),
                details: details.map(str::to_string),
                context,
                at: self.clock.utc_now(),
            },
        )
    }

    pub fn daemon_errors(&self, daemon_id: &DaemonId) -> Vec<DaemonError> {
        let inner = self.inner.lock();
        inner
            .state
            .daemon_errors
            .iter()
            .filter(|e| e.daemon_id == *daemon_id)
            .cloned()
            .collect()
    }

    pub fn record_daemon_activity(
        &self,
        daemon_id: DaemonId,
        activity_type: ActivityType,
        message: &str,
        details: JsonMap,
        severity: &str,
    ) -> Result<(), StoreError> {
        let activity = DaemonActivity {
            daemon_id,
            activity_type,
            message: message.to_string(),
            details,
            severity: severity.to_string(),
            created_at: self.clock.utc_now(),
        };
        let mut inner = self.inner.lock();
        Self::commit(&mut inner, Event::DaemonActivityRecorded { activity })
    }

    pub fn record_daemon_metric(
        &self,
        daemon_id: DaemonId,
        name: &str,
        value: f64,
        unit: Option<&str>,
    ) -> Result<(), StoreError> {
        let metric = DaemonMetric {
            daemon_id,
            name: name.to_string(),
            value,
            unit: unit.map(str::to_string),
            created_at: self.clock.utc_now(),
        };
        let mut inner = self.inner.lock();
        Self::commit(&mut inner, Event::DaemonMetricRecorded { metric })
    }

    pub fn update_daemon_progress(
        &self,
        daemon_id: DaemonId,
        current_activity: Option<&str>,
        progress: Option<f64>,
        items_processed: Option<u64>,
        items_pending: Option<u64>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        Self::commit(
            &mut inner,
            Event::DaemonProgressUpdated {
                daemon_id,
                current_activity: current_activity.map(str::to_string),
                progress,
                items_processed,
                items_pending,
                at: self.clock.utc_now(),
            },
        )
    }

    pub fn daemon_status_row(&self, daemon_id: &DaemonId) -> Option<DaemonStatusRow> {
        self.inner.lock().state.daemon_status.get(daemon_id).cloned()
    }

    // ---- sync ----

    /// Insert an `in_progress` sync row.
    pub fn begin_sync(
        &self,
        entity_type: SyncEntityType,
        job_id: Option<JobId>,
    ) -> Result<SyncHistory, StoreError> {
        let entry = SyncHistory::begin(entity_type, job_id, self.clock.utc_now());
        let mut inner = self.inner.lock();
        Self::commit(&mut inner, Event::SyncStarted { entry: entry.clone() })?;
        Ok(entry)
    }

    /// Stamp the final status and counters on a sync row.
    pub fn finish_sync(
        &self,
        id: SyncId,
        status: SyncRunStatus,
        counters: SyncCounters,
        error_details: Option<Value>,
    ) -> Result<SyncHistory, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.sync_history.iter().any(|s| s.id == id) {
            return Err(StoreError::NotFound(format!("sync {id}")));
        }
        Self::commit(
            &mut inner,
            Event::SyncFinished {
                id,
                status,
                completed_at: self.clock.utc_now(),
                counters,
                error_details,
            },
        )?;
        inner
            .state
            .sync_history
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("sync {id}")))
    }

    /// Last successful sync time for an entity type.
    pub fn last_sync(&self, entity_type: SyncEntityType) -> Option<DateTime<Utc>> {
        self.inner.lock().state.last_sync(entity_type)
    }

    pub fn sync_history(
        &self,
        entity_type: Option<SyncEntityType>,
        limit: usize,
    ) -> Vec<SyncHistory> {
        let inner = self.inner.lock();
        inner
            .state
            .sync_history_sorted(entity_type)
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
