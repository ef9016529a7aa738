// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test daemon: exercises the full daemon contract with a trivial loop.
//!
//! Heartbeats every tick, logs periodically, and occasionally launches a
//! TEST job which it monitors to completion.
//!
//! Configuration keys:
//! - `tick_interval_seconds`: loop cadence (default 10)
//! - `job_interval_seconds`: seconds between TEST job launches (default 300)

use crate::contract::{Daemon, DaemonContext, DaemonError};
use async_trait::async_trait;
use stashhog_core::{
    ActivityType, DaemonJobAction, DaemonKind, JobId, JobParams, JobType, JsonMap, LogLevel,
};
use std::time::Duration;
use tokio::time::Instant;

pub struct TestDaemon;

impl TestDaemon {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TestDaemon {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Daemon for TestDaemon {
    fn kind(&self) -> DaemonKind {
        DaemonKind::Test
    }

    async fn on_start(&self, ctx: &DaemonContext) -> Result<(), DaemonError> {
        ctx.log(LogLevel::Info, "Test daemon initialized").await;
        Ok(())
    }

    async fn run(&self, ctx: &DaemonContext) -> Result<(), DaemonError> {
        let tick_interval = ctx.config_u64("tick_interval_seconds", 10);
        let job_interval = ctx.config_u64("job_interval_seconds", 300);

        let mut tick = 0u64;
        let mut monitored: Option<JobId> = None;
        let mut last_launch: Option<Instant> = None;

        while !ctx.is_cancelled() {
            tick += 1;
            ctx.update_heartbeat().await;
            ctx.log(LogLevel::Debug, &format!("Test daemon tick {tick}")).await;

            if let Some(job_id) = monitored {
                match ctx.job(&job_id) {
                    Some(job) if job.is_terminal() => {
                        ctx.log(
                            LogLevel::Info,
                            &format!("Test job {job_id} finished with status {}", job.status),
                        )
                        .await;
                        ctx.track_job_action(
                            job_id,
                            DaemonJobAction::Finished,
                            Some(&format!("Job completed with status {}", job.status)),
                        )
                        .await;
                        ctx.track_metric("test_jobs_completed", 1.0, Some("count")).await;
                        monitored = None;
                    }
                    Some(_) => {}
                    None => {
                        ctx.log(
                            LogLevel::Warning,
                            &format!("Test job {job_id} disappeared, dropping"),
                        )
                        .await;
                        monitored = None;
                    }
                }
            } else if last_launch.is_none_or(|t| t.elapsed().as_secs() >= job_interval) {
                let job = ctx
                    .launch_job(
                        JobType::Test,
                        JobParams::Test { steps: 3, step_delay_ms: 500, fail_at_step: None },
                        JsonMap::new(),
                        Some("Periodic test job"),
                    )
                    .await?;
                ctx.track_activity(
                    ActivityType::JobLaunched,
                    &format!("Launched test job {}", job.id),
                    JsonMap::new(),
                    "info",
                )
                .await;
                monitored = Some(job.id);
                last_launch = Some(Instant::now());
            }

            if !ctx.sleep(Duration::from_secs(tick_interval.max(1))).await {
                break;
            }
        }

        ctx.log(LogLevel::Info, "Test daemon received shutdown signal").await;
        Ok(())
    }

    async fn on_stop(&self, ctx: &DaemonContext) {
        ctx.log(LogLevel::Info, "Test daemon shutting down").await;
    }
}

#[cfg(test)]
#[path = "test_daemon_tests.rs"]
mod tests;
