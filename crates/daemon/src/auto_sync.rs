// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto stash sync daemon: watches for scenes updated upstream and launches
//! incremental sync jobs, one outstanding at a time.
//!
//! Configuration keys:
//! - `heartbeat_interval`: seconds between heartbeat refreshes (default 30)
//! - `job_interval_seconds`: seconds between pending checks (default 300)

use crate::contract::{Daemon, DaemonContext, DaemonError};
use async_trait::async_trait;
use stashhog_core::{
    DaemonJobAction, DaemonKind, JobId, JobParams, JobStatus, JobType, JsonMap, LogLevel,
};
use stashhog_engine::SyncCoordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Backoff after an unexpected error in the loop body.
const ERROR_BACKOFF: Duration = Duration::from_secs(30);
/// Poll interval while a launched job is outstanding.
const MONITOR_INTERVAL: Duration = Duration::from_secs(5);

pub struct AutoStashSyncDaemon {
    sync: Arc<SyncCoordinator>,
}

impl AutoStashSyncDaemon {
    pub fn new(sync: Arc<SyncCoordinator>) -> Self {
        Self { sync }
    }

    /// Check upstream for pending scenes; launch a sync job when any exist.
    async fn check_and_launch(&self, ctx: &DaemonContext) -> Result<Option<JobId>, DaemonError> {
        let pending = self.sync.pending_scene_count().await?;
        if pending == 0 {
            ctx.log(LogLevel::Debug, "No scenes pending sync from Stash").await;
            return Ok(None);
        }

        ctx.log(
            LogLevel::Info,
            &format!("Found {pending} scenes pending sync from Stash"),
        )
        .await;

        let mut metadata = JsonMap::new();
        metadata.insert("created_by".into(), "auto_stash_sync".into());
        let job = ctx
            .launch_job(
                JobType::Sync,
                JobParams::Sync { force: false, pending_scenes: Some(pending) },
                metadata,
                Some(&format!("Incremental sync for {pending} pending scenes")),
            )
            .await?;

        ctx.log(
            LogLevel::Info,
            &format!("Created incremental sync job {} for {pending} pending scenes", job.id),
        )
        .await;
        ctx.update_progress(Some("incremental sync running"), None, None, Some(pending)).await;
        Ok(Some(job.id))
    }

    /// Returns true once the monitored job reached a terminal state.
    async fn check_monitored(&self, ctx: &DaemonContext, job_id: JobId) -> bool {
        let Some(job) = ctx.job(&job_id) else {
            ctx.log(
                LogLevel::Warning,
                &format!("Job {job_id} not found, removing from monitoring"),
            )
            .await;
            return true;
        };
        if !job.is_terminal() {
            return false;
        }

        let pending = match &job.parameters {
            JobParams::Sync { pending_scenes, .. } => pending_scenes.unwrap_or(0),
            _ => 0,
        };
        match job.status {
            JobStatus::Completed => {
                ctx.log(
                    LogLevel::Info,
                    &format!(
                        "Executed incremental sync due to {pending} scenes that needed to be \
                         resynced. Job {job_id} completed successfully."
                    ),
                )
                .await;
            }
            JobStatus::Cancelled => {
                ctx.log(LogLevel::Warning, &format!("Sync job {job_id} was cancelled")).await;
            }
            other => {
                ctx.log(
                    LogLevel::Warning,
                    &format!("Sync job {job_id} completed with status: {other}"),
                )
                .await;
            }
        }
        ctx.track_job_action(
            job_id,
            DaemonJobAction::Finished,
            Some(&format!("Job completed with status {}", job.status)),
        )
        .await;
        true
    }
}

#[async_trait]
impl Daemon for AutoStashSyncDaemon {
    fn kind(&self) -> DaemonKind {
        DaemonKind::AutoStashSync
    }

    async fn on_start(&self, ctx: &DaemonContext) -> Result<(), DaemonError> {
        ctx.log(LogLevel::Info, "Auto Stash Sync Daemon initialized").await;
        Ok(())
    }

    async fn run(&self, ctx: &DaemonContext) -> Result<(), DaemonError> {
        let heartbeat_interval = ctx.config_u64("heartbeat_interval", 30);
        let job_interval = ctx.config_u64("job_interval_seconds", 300);
        ctx.log(
            LogLevel::Info,
            &format!(
                "Auto Stash Sync Daemon started (heartbeat_interval={heartbeat_interval}s, \
                 job_interval_seconds={job_interval}s)"
            ),
        )
        .await;

        let mut last_heartbeat: Option<Instant> = None;
        let mut last_completion: Option<Instant> = None;
        let mut monitored: Option<JobId> = None;

        while !ctx.is_cancelled() {
            if last_heartbeat.is_none_or(|t| t.elapsed().as_secs() >= heartbeat_interval) {
                ctx.update_heartbeat().await;
                last_heartbeat = Some(Instant::now());
            }

            if let Some(job_id) = monitored {
                if self.check_monitored(ctx, job_id).await {
                    monitored = None;
                    last_completion = Some(Instant::now());
                    ctx.update_progress(Some("idle"), None, None, Some(0)).await;
                }
                if !ctx.sleep(MONITOR_INTERVAL).await {
                    break;
                }
                continue;
            }

            let since_last = last_completion.map(|t| t.elapsed().as_secs());
            if since_last.is_none_or(|s| s >= job_interval) {
                match self.check_and_launch(ctx).await {
                    Ok(Some(job_id)) => {
                        monitored = Some(job_id);
                        if !ctx.sleep(MONITOR_INTERVAL).await {
                            break;
                        }
                    }
                    Ok(None) => {
                        if !ctx.sleep(Duration::from_secs(job_interval)).await {
                            break;
                        }
                    }
                    Err(e) => {
                        ctx.log(
                            LogLevel::Error,
                            &format!("Auto Stash Sync Daemon error: {e}"),
                        )
                        .await;
                        ctx.track_error(
                            stashhog_core::ErrorType::Connection,
                            &e.to_string(),
                            None,
                            JsonMap::new(),
                        )
                        .await;
                        if !ctx.sleep(ERROR_BACKOFF).await {
                            break;
                        }
                    }
                }
            } else {
                let remaining = job_interval.saturating_sub(since_last.unwrap_or(0));
                // Cap the wait so the heartbeat stays fresh.
                let nap = Duration::from_secs(remaining.min(30).max(1));
                if !ctx.sleep(nap).await {
                    break;
                }
            }
        }

        ctx.log(LogLevel::Info, "Auto Stash Sync Daemon received shutdown signal").await;
        Ok(())
    }

    async fn on_stop(&self, ctx: &DaemonContext) {
        ctx.log(LogLevel::Info, "Auto Stash Sync Daemon shutting down").await;
    }
}

#[cfg(test)]
#[path = "auto_sync_tests.rs"]
mod tests;
