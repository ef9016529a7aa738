// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon supervisor: lifecycle of named long-lived loops.
//!
//! One in-process instance per daemon id. A supervised task wraps each
//! `run`: an unexpected error exit records a DaemonError row and flips the
//! row to ERROR; a clean exit (cancellation) leaves the status transitions
//! to `stop`.

use crate::contract::{Daemon, DaemonContext, DaemonError};
use parking_lot::Mutex;
use stashhog_core::{
    DaemonId, DaemonKind, DaemonRecord, DaemonRunStatus, ErrorType, JsonMap, LogLevel,
};
use stashhog_engine::{EventBus, JobService};
use stashhog_storage::Store;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Heartbeat age beyond which a running daemon counts as unhealthy.
const HEALTHY_HEARTBEAT_AGE: Duration = Duration::from_secs(120);

/// Grace period for a daemon to acknowledge cancellation before its task is
/// aborted.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Maps a daemon kind to its implementation.
pub type DaemonFactory = Box<dyn Fn(DaemonKind) -> Option<Arc<dyn Daemon>> + Send + Sync>;

struct RunningDaemon {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

struct SupervisorInner {
    store: Store,
    bus: EventBus,
    jobs: JobService,
    factory: DaemonFactory,
    running: Mutex<HashMap<DaemonId, RunningDaemon>>,
}

/// Shared supervisor handle.
#[derive(Clone)]
pub struct DaemonSupervisor {
    inner: Arc<SupervisorInner>,
}

/// One entry in the health report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthEntry {
    pub id: DaemonId,
    pub name: String,
    pub reason: Option<String>,
}

/// Health classification across all daemon rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaemonHealth {
    pub healthy: Vec<HealthEntry>,
    pub unhealthy: Vec<HealthEntry>,
    pub stopped: Vec<HealthEntry>,
}

impl DaemonSupervisor {
    pub fn new(store: Store, bus: EventBus, jobs: JobService, factory: DaemonFactory) -> Self {
        Self {
            inner: Arc::new(SupervisorInner {
                store,
                bus,
                jobs,
                factory,
                running: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start every `auto_start` daemon. Individual failures are logged and
    /// do not abort the rest.
    pub async fn initialize(&self) {
        let auto_start: Vec<DaemonRecord> = self
            .inner
            .store
            .daemons()
            .into_iter()
            .filter(|d| d.auto_start)
            .collect();
        info!(count = auto_start.len(), "auto-starting daemons");
        for record in auto_start {
            if let Err(e) = self.start(&record.id).await {
                error!(daemon = %record.name, error = %e, "failed to auto-start daemon");
            }
        }
    }

    /// Start one daemon by id. Fails when already running in this process.
    pub async fn start(&self, id: &DaemonId) -> Result<(), DaemonError> {
        {
            let mut running = self.inner.running.lock();
            if let Some(existing) = running.get(id) {
                if existing.join.is_finished() {
                    running.remove(id);
                } else {
                    return Err(DaemonError::Validation(format!(
                        "daemon {id} is already running"
                    )));
                }
            }
        }

        let record = self
            .inner
            .store
            .daemon(id)
            .ok_or_else(|| DaemonError::NotFound(format!("daemon {id}")))?;
        let daemon = (self.inner.factory)(record.kind).ok_or_else(|| {
            DaemonError::Validation(format!("unknown daemon type: {}", record.kind))
        })?;

        let cancel = CancellationToken::new();
        let ctx = DaemonContext::new(
            record.id,
            record.configuration.clone(),
            self.inner.store.clone(),
            self.inner.bus.clone(),
            self.inner.jobs.clone(),
            cancel.clone(),
        );

        let now = self.inner.store.clock().utc_now();
        self.inner
            .store
            .set_daemon_status(id, DaemonRunStatus::Running, Some(now))?;
        info!(daemon = %record.name, daemon_id = %id, "starting daemon");

        let store = self.inner.store.clone();
        let daemon_id = record.id;
        let name = record.name.clone();
        let join = tokio::spawn(async move {
            supervised_run(daemon, ctx, store, daemon_id, name).await;
        });

        self.inner.running.lock().insert(record.id, RunningDaemon { cancel, join });
        Ok(())
    }

    /// Signal cancellation, await a bounded grace period, mark STOPPED.
    pub async fn stop(&self, id: &DaemonId) -> Result<(), DaemonError> {
        let running = self
            .inner
            .running
            .lock()
            .remove(id)
            .ok_or_else(|| DaemonError::Validation(format!("daemon {id} is not running")))?;

        running.cancel.cancel();
        let mut join = running.join;
        if tokio::time::timeout(STOP_GRACE, &mut join).await.is_err() {
            warn!(daemon_id = %id, "daemon did not stop within grace period, aborting");
            join.abort();
        }

        self.inner.store.set_daemon_status(id, DaemonRunStatus::Stopped, None)?;
        info!(daemon_id = %id, "daemon stopped");
        Ok(())
    }

    /// Stop (when running) then start.
    pub async fn restart(&self, id: &DaemonId) -> Result<(), DaemonError> {
        if self.is_running(id) {
            self.stop(id).await?;
        }
        self.start(id).await
    }

    /// Persist new configuration/flags; takes effect on the next start.
    pub fn update_config(
        &self,
        id: &DaemonId,
        configuration: Option<JsonMap>,
        enabled: Option<bool>,
        auto_start: Option<bool>,
    ) -> Result<DaemonRecord, DaemonError> {
        Ok(self
            .inner
            .store
            .update_daemon_config(id, configuration, enabled, auto_start)?)
    }

    pub fn is_running(&self, id: &DaemonId) -> bool {
        self.inner
            .running
            .lock()
            .get(id)
            .is_some_and(|r| !r.join.is_finished())
    }

    pub fn running_ids(&self) -> Vec<DaemonId> {
        self.inner
            .running
            .lock()
            .iter()
            .filter(|(_, r)| !r.join.is_finished())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Classify each daemon row: expected-to-run, actually running, and
    /// heartbeat younger than two minutes.
    pub fn health(&self) -> DaemonHealth {
        let now = self.inner.store.clock().utc_now();
        let mut report = DaemonHealth::default();

        for record in self.inner.store.daemons() {
            let entry = |reason: Option<String>| HealthEntry {
                id: record.id,
                name: record.name.clone(),
                reason,
            };

            if !record.enabled {
                report.stopped.push(entry(None));
                continue;
            }
            if !self.is_running(&record.id) {
                report
                    .unhealthy
                    .push(entry(Some("Should be running but is not".to_string())));
                continue;
            }
            match record.last_heartbeat {
                Some(beat) => {
                    let age = now.signed_duration_since(beat);
                    if age.num_seconds() <= HEALTHY_HEARTBEAT_AGE.as_secs() as i64 {
                        report.healthy.push(entry(None));
                    } else {
                        report
                            .unhealthy
                            .push(entry(Some("No recent heartbeat".to_string())));
                    }
                }
                None => {
                    report
                        .unhealthy
                        .push(entry(Some("No heartbeat recorded".to_string())));
                }
            }
        }
        report
    }

    /// Stop every running daemon.
    pub async fn shutdown(&self) {
        let ids: Vec<DaemonId> = self.inner.running.lock().keys().copied().collect();
        for id in ids {
            if let Err(e) = self.stop(&id).await {
                warn!(daemon_id = %id, error = %e, "error stopping daemon during shutdown");
            }
        }
    }
}

/// Wraps one daemon execution: on_start, run, on_stop, crash recording.
async fn supervised_run(
    daemon: Arc<dyn Daemon>,
    ctx: DaemonContext,
    store: Store,
    daemon_id: DaemonId,
    name: String,
) {
    if let Err(e) = daemon.on_start(&ctx).await {
        error!(daemon = %name, error = %e, "daemon on_start failed");
        record_crash(&ctx, &store, &daemon_id, &e).await;
        return;
    }

    let result = daemon.run(&ctx).await;
    daemon.on_stop(&ctx).await;

    match result {
        Ok(()) => {
            if !ctx.is_cancelled() {
                // The loop exited on its own; reflect reality in the row.
                warn!(daemon = %name, "daemon loop exited without a stop request");
                if let Err(e) =
                    store.set_daemon_status(&daemon_id, DaemonRunStatus::Stopped, None)
                {
                    warn!(daemon = %name, error = %e, "failed to mark daemon stopped");
                }
            }
        }
        Err(e) => {
            error!(daemon = %name, error = %e, "daemon crashed");
            ctx.log(LogLevel::Error, &format!("Daemon crashed: {e}")).await;
            record_crash(&ctx, &store, &daemon_id, &e).await;
        }
    }
}

async fn record_crash(
    ctx: &DaemonContext,
    store: &Store,
    daemon_id: &DaemonId,
    cause: &DaemonError,
) {
    ctx.track_error(ErrorType::Unknown, &cause.to_string(), None, JsonMap::new()).await;
    let started_at = store.daemon(daemon_id).and_then(|d| d.started_at);
    if let Err(e) = store.set_daemon_status(daemon_id, DaemonRunStatus::Error, started_at) {
        warn!(daemon_id = %daemon_id, error = %e, "failed to mark daemon errored");
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
