// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync history: the append-only audit trail of sync attempts.

use crate::id::{JobId, SyncId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream entity class covered by one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEntityType {
    Scene,
    Performer,
    Tag,
    Studio,
}

impl SyncEntityType {
    pub const ALL: [SyncEntityType; 4] = [
        SyncEntityType::Scene,
        SyncEntityType::Performer,
        SyncEntityType::Tag,
        SyncEntityType::Studio,
    ];
}

crate::simple_display! {
    SyncEntityType {
        Scene => "scene",
        Performer => "performer",
        Tag => "tag",
        Studio => "studio",
    }
}

/// Final state of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    InProgress,
    Completed,
    Failed,
}

crate::simple_display! {
    SyncRunStatus {
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Item counters accumulated during one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounters {
    pub synced: u64,
    pub created: u64,
    pub updated: u64,
    pub failed: u64,
}

/// Audit row for one sync attempt on one entity class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHistory {
    pub id: SyncId,
    pub entity_type: SyncEntityType,
    pub job_id: Option<JobId>,
    pub status: SyncRunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub counters: SyncCounters,
    pub error_details: Option<serde_json::Value>,
}

impl SyncHistory {
    pub fn begin(
        entity_type: SyncEntityType,
        job_id: Option<JobId>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SyncId::new(),
            entity_type,
            job_id,
            status: SyncRunStatus::InProgress,
            started_at,
            completed_at: None,
            counters: SyncCounters::default(),
            error_details: None,
        }
    }
}
