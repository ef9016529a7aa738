// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator: the single source of truth for pending work.

use crate::error::JobError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use stashhog_core::{JobId, SyncCounters, SyncEntityType, SyncHistory, SyncId, SyncRunStatus};
use stashhog_stash::{upstream_timestamp, FindFilter, SceneFilter, StashApi, TimestampCriterion};
use stashhog_storage::Store;
use std::sync::Arc;
use tracing::info;

/// Last-sync times plus the pending count, for status surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatusSummary {
    pub last_scene_sync: Option<DateTime<Utc>>,
    pub last_performer_sync: Option<DateTime<Utc>>,
    pub last_tag_sync: Option<DateTime<Utc>>,
    pub last_studio_sync: Option<DateTime<Utc>>,
    pub pending_scenes: u64,
}

/// Computes "pending since last sync" against the upstream and records
/// sync attempts.
#[derive(Clone)]
pub struct SyncCoordinator {
    store: Store,
    api: Arc<dyn StashApi>,
    upstream_tz: chrono_tz::Tz,
}

impl SyncCoordinator {
    pub fn new(store: Store, api: Arc<dyn StashApi>, upstream_tz: chrono_tz::Tz) -> Self {
        Self { store, api, upstream_tz }
    }

    /// Last successful sync completion for an entity type.
    pub fn last_sync(&self, entity_type: SyncEntityType) -> Option<DateTime<Utc>> {
        self.store.last_sync(entity_type)
    }

    /// The incremental filter for scenes updated since the watermark, or
    /// `None` when nothing has synced yet (everything is pending).
    pub fn incremental_scene_filter(&self) -> Option<SceneFilter> {
        self.last_sync(SyncEntityType::Scene).map(|watermark| SceneFilter {
            updated_at: Some(TimestampCriterion::greater_than(upstream_timestamp(
                watermark,
                self.upstream_tz,
            ))),
        })
    }

    /// Count of upstream scenes updated since the last scene sync; the full
    /// scene count when no sync has completed yet.
    pub async fn pending_scene_count(&self) -> Result<u64, JobError> {
        let filter = self.incremental_scene_filter();
        if let Some(f) = &filter {
            if let Some(c) = &f.updated_at {
                info!(since = %c.value, "checking for scenes updated upstream");
            }
        }
        let page = self
            .api
            .find_scenes(filter.as_ref(), &FindFilter { page: 1, per_page: 1 })
            .await?;
        Ok(page.count)
    }

    /// Insert an `in_progress` history row for a sync run.
    pub fn begin_sync(
        &self,
        entity_type: SyncEntityType,
        job_id: Option<JobId>,
    ) -> Result<SyncHistory, JobError> {
        Ok(self.store.begin_sync(entity_type, job_id)?)
    }

    /// Stamp the final status and counters on a sync run.
    pub fn finish_sync(
        &self,
        id: SyncId,
        status: SyncRunStatus,
        counters: SyncCounters,
        error_details: Option<Value>,
    ) -> Result<SyncHistory, JobError> {
        Ok(self.store.finish_sync(id, status, counters, error_details)?)
    }

    /// Comprehensive sync status across all entity types.
    pub async fn status(&self) -> Result<SyncStatusSummary, JobError> {
        Ok(SyncStatusSummary {
            last_scene_sync: self.last_sync(SyncEntityType::Scene),
            last_performer_sync: self.last_sync(SyncEntityType::Performer),
            last_tag_sync: self.last_sync(SyncEntityType::Tag),
            last_studio_sync: self.last_sync(SyncEntityType::Studio),
            pending_scenes: self.pending_scene_count().await?,
        })
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
