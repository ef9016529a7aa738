// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync job handler: pages through the upstream since the last watermark
//! and records SyncHistory rows.

use crate::error::JobError;
use crate::service::{JobContext, JobHandler};
use crate::sync::SyncCoordinator;
use async_trait::async_trait;
use stashhog_core::{
    JobParams, JobType, JsonMap, SyncCounters, SyncEntityType, SyncRunStatus,
};
use stashhog_stash::{FindFilter, StashApi};
use std::sync::Arc;
use tracing::info;

const PAGE_SIZE: u32 = 100;

/// Handles SYNC plus the four per-entity sync types.
pub struct SyncHandler {
    coordinator: Arc<SyncCoordinator>,
    api: Arc<dyn StashApi>,
}

impl SyncHandler {
    pub fn new(coordinator: Arc<SyncCoordinator>, api: Arc<dyn StashApi>) -> Self {
        Self { coordinator, api }
    }

    fn entities_for(kind: JobType) -> Vec<SyncEntityType> {
        match kind {
            JobType::Sync => SyncEntityType::ALL.to_vec(),
            JobType::SyncScenes => vec![SyncEntityType::Scene],
            JobType::SyncPerformers => vec![SyncEntityType::Performer],
            JobType::SyncTags => vec![SyncEntityType::Tag],
            JobType::SyncStudios => vec![SyncEntityType::Studio],
            _ => Vec::new(),
        }
    }

    /// Pull every matching scene page, counting items.
    async fn sync_scenes(&self, ctx: &JobContext, force: bool) -> Result<u64, JobError> {
        let filter = if force { None } else { self.coordinator.incremental_scene_filter() };
        let mut page = 1u32;
        let mut synced = 0u64;
        let mut total = 0u64;

        loop {
            ctx.check_cancelled()?;
            let result = self
                .api
                .find_scenes(filter.as_ref(), &FindFilter { page, per_page: PAGE_SIZE })
                .await?;
            total = result.count;
            let fetched = result.scenes.len() as u64;
            synced += fetched;
            ctx.reporter
                .set_counts(synced.min(total), total, Some("Syncing scenes"))
                .await?;

            if fetched == 0 || u64::from(page) * u64::from(PAGE_SIZE) >= total {
                break;
            }
            page += 1;
        }
        Ok(synced)
    }

    async fn sync_entity(
        &self,
        ctx: &JobContext,
        entity: SyncEntityType,
        force: bool,
    ) -> Result<u64, JobError> {
        ctx.check_cancelled()?;
        match entity {
            SyncEntityType::Scene => self.sync_scenes(ctx, force).await,
            SyncEntityType::Performer => Ok(self.api.find_performers(None).await?.len() as u64),
            SyncEntityType::Tag => Ok(self.api.find_tags(None).await?.len() as u64),
            SyncEntityType::Studio => Ok(self.api.find_studios(None).await?.len() as u64),
        }
    }
}

#[async_trait]
impl JobHandler for SyncHandler {
    async fn run(&self, ctx: JobContext) -> Result<JsonMap, JobError> {
        let force = match &ctx.params {
            JobParams::Sync { force, .. } => *force,
            JobParams::SceneSync { force, .. } => *force,
            JobParams::EntitySync { force } => *force,
            JobParams::Empty => false,
            other => {
                return Err(JobError::Validation(format!(
                    "unexpected parameters for sync job: {other:?}"
                )));
            }
        };

        let entities = Self::entities_for(ctx.kind);
        let mut result = JsonMap::new();

        for entity in entities {
            let history = self.coordinator.begin_sync(entity, Some(ctx.job_id))?;
            info!(entity = %entity, sync_id = %history.id, "sync started");

            match self.sync_entity(&ctx, entity, force).await {
                Ok(synced) => {
                    self.coordinator.finish_sync(
                        history.id,
                        SyncRunStatus::Completed,
                        SyncCounters { synced, ..Default::default() },
                        None,
                    )?;
                    result.insert(format!("{entity}s_synced"), synced.into());
                }
                Err(e) => {
                    let status = SyncRunStatus::Failed;
                    let details = serde_json::json!({ "error": e.to_string() });
                    self.coordinator.finish_sync(
                        history.id,
                        status,
                        SyncCounters::default(),
                        Some(details),
                    )?;
                    return Err(e);
                }
            }
        }

        ctx.reporter.set_progress(100, Some("Sync complete")).await?;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "sync_jobs_tests.rs"]
mod tests;
