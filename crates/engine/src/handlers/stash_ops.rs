// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream-driven jobs: trigger a scan or generate, then follow the
//! upstream job to completion.

use crate::error::JobError;
use crate::service::{JobContext, JobHandler};
use async_trait::async_trait;
use stashhog_core::{JobParams, JsonMap};
use stashhog_stash::{poll_stash_job, GenerateInput, PollOutcome, ScanInput, StashApi};
use std::sync::Arc;
use tracing::info;

pub struct StashScanHandler {
    api: Arc<dyn StashApi>,
}

impl StashScanHandler {
    pub fn new(api: Arc<dyn StashApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl JobHandler for StashScanHandler {
    async fn run(&self, ctx: JobContext) -> Result<JsonMap, JobError> {
        let (paths, rescan) = match &ctx.params {
            JobParams::Scan { paths, rescan } => (paths.clone(), *rescan),
            other => {
                return Err(JobError::Validation(format!(
                    "unexpected parameters for stash_scan job: {other:?}"
                )));
            }
        };

        ctx.reporter.set_progress(0, Some("Starting Stash metadata scan")).await?;
        let upstream_id = self.api.metadata_scan(&ScanInput::new(paths, rescan)).await?;
        info!(upstream_id, "started upstream scan job");
        ctx.reporter
            .set_progress(10, Some(&format!("Stash job started: {upstream_id}")))
            .await?;

        follow_upstream(&ctx, self.api.as_ref(), &upstream_id, "Stash scan").await
    }
}

pub struct StashGenerateHandler {
    api: Arc<dyn StashApi>,
}

impl StashGenerateHandler {
    pub fn new(api: Arc<dyn StashApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl JobHandler for StashGenerateHandler {
    async fn run(&self, ctx: JobContext) -> Result<JsonMap, JobError> {
        let overwrite = match &ctx.params {
            JobParams::Generate { overwrite } => *overwrite,
            other => {
                return Err(JobError::Validation(format!(
                    "unexpected parameters for stash_generate job: {other:?}"
                )));
            }
        };

        ctx.reporter.set_progress(0, Some("Starting Stash metadata generation")).await?;
        let upstream_id = self.api.metadata_generate(&GenerateInput::new(overwrite)).await?;
        info!(upstream_id, "started upstream generate job");
        ctx.reporter
            .set_progress(10, Some(&format!("Stash job started: {upstream_id}")))
            .await?;

        follow_upstream(&ctx, self.api.as_ref(), &upstream_id, "Stash generate").await
    }
}

/// Poll the upstream job, mapping its terminal state to ours.
async fn follow_upstream(
    ctx: &JobContext,
    api: &dyn StashApi,
    upstream_id: &str,
    label: &str,
) -> Result<JsonMap, JobError> {
    let reporter = ctx.reporter.clone();
    let outcome = poll_stash_job(
        api,
        upstream_id,
        label,
        move |pct, message| {
            let reporter = reporter.clone();
            async move {
                // Keep the trigger progress floor so the bar never jumps back.
                let _ = reporter.set_progress(pct.max(10), Some(&message)).await;
            }
        },
        &ctx.cancel,
    )
    .await?;

    match outcome {
        PollOutcome::Completed => {
            ctx.reporter.set_progress(100, Some(&format!("{label} completed"))).await?;
            let mut map = JsonMap::new();
            map.insert("stash_job_id".into(), upstream_id.into());
            map.insert("status".into(), "completed".into());
            Ok(map)
        }
        PollOutcome::Failed(error) => Err(JobError::Handler(error)),
        PollOutcome::Cancelled => {
            ctx.reporter
                .set_progress(100, Some(&format!("{label} was cancelled upstream")))
                .await?;
            Err(JobError::Cancelled)
        }
    }
}

#[cfg(test)]
#[path = "stash_ops_tests.rs"]
mod tests;
