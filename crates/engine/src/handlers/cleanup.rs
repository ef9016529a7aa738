// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maintenance cleanup: prune old terminal jobs and fail stale in-flight
//! jobs left behind by a previous process.

use crate::error::JobError;
use crate::service::{JobContext, JobHandler};
use async_trait::async_trait;
use stashhog_core::{JobParams, JsonMap};
use stashhog_storage::Store;
use tracing::info;

/// How long a non-terminal job may sit untouched before the cleanup pass
/// rewrites it to FAILED.
const STALE_AFTER_HOURS: i64 = 24;

pub struct CleanupHandler {
    store: Store,
}

impl CleanupHandler {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JobHandler for CleanupHandler {
    async fn run(&self, ctx: JobContext) -> Result<JsonMap, JobError> {
        let days = match &ctx.params {
            JobParams::Cleanup { days } => *days,
            JobParams::Empty => 30,
            other => {
                return Err(JobError::Validation(format!(
                    "unexpected parameters for cleanup job: {other:?}"
                )));
            }
        };

        ctx.reporter.set_progress(0, Some("Cleaning up old jobs")).await?;
        let now = self.store.clock().utc_now();

        let deleted = self.store.cleanup_old_jobs(now - chrono::Duration::days(i64::from(days)))?;
        ctx.check_cancelled()?;

        let stale_failed =
            self.store.fail_stale_jobs(now - chrono::Duration::hours(STALE_AFTER_HOURS))?;

        info!(deleted, stale_failed, "cleanup finished");
        ctx.reporter.set_progress(100, Some("Cleanup complete")).await?;

        let mut result = JsonMap::new();
        result.insert("deleted_jobs".into(), deleted.into());
        result.insert("stale_jobs_failed".into(), stale_failed.into());
        Ok(result)
    }
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
