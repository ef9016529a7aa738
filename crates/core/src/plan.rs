// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analysis plans and their proposed changes.
//!
//! A plan is a reviewable batch of field edits produced by an analysis run.
//! It is created PENDING while the analysis streams changes into it, becomes
//! DRAFT when analysis finishes, moves to REVIEWING on the first
//! accept/reject, and ends APPLIED or CANCELLED.

use crate::id::JobId;
use crate::JsonMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Status of an analysis plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanStatus {
    /// Being actively built during analysis.
    Pending,
    Draft,
    Reviewing,
    Applied,
    Cancelled,
}

impl PlanStatus {
    /// Plans accept apply requests only while under review.
    pub fn can_be_applied(&self) -> bool {
        matches!(self, PlanStatus::Draft | PlanStatus::Reviewing)
    }
}

crate::simple_display! {
    PlanStatus {
        Pending => "pending",
        Draft => "draft",
        Reviewing => "reviewing",
        Applied => "applied",
        Cancelled => "cancelled",
    }
}

/// Kind of edit a change proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// Add an item to a list field (performer, tag).
    Add,
    /// Remove an item from a list field.
    Remove,
    /// Update an existing field value.
    Update,
    /// Set a single-valued field.
    Set,
}

crate::simple_display! {
    ChangeAction {
        Add => "add",
        Remove => "remove",
        Update => "update",
        Set => "set",
    }
}

/// Review status of an individual change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Pending,
    Approved,
    Rejected,
    Applied,
}

crate::simple_display! {
    ChangeStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Applied => "applied",
    }
}

/// Metadata key recorded when a plan finalizes with nothing to do.
pub const PLAN_META_REASON: &str = "reason";
/// Reason recorded on auto-applied empty plans.
pub const NO_CHANGES_REASON: &str = "No changes detected";

/// A named batch of proposed scene edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPlan {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Settings used, statistics, finalization reason.
    #[serde(default)]
    pub metadata: JsonMap,
    pub status: PlanStatus,
    /// Job that produced this plan, if any.
    pub job_id: Option<JobId>,
    pub created_at: DateTime<Utc>,
    pub applied_at: Option<DateTime<Utc>>,
}

impl AnalysisPlan {
    pub fn can_be_applied(&self) -> bool {
        self.status.can_be_applied()
    }
}

/// One proposed field edit on one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanChange {
    pub id: i64,
    pub plan_id: i64,
    pub scene_id: String,
    /// Target field: "title", "details", "date", "rating", "studio",
    /// "performers", "tags".
    pub field: String,
    pub action: ChangeAction,
    /// Current value, kept for review context.
    pub current_value: Option<serde_json::Value>,
    pub proposed_value: serde_json::Value,
    /// AI confidence score in [0, 1], when available.
    pub confidence: Option<f64>,
    pub status: ChangeStatus,
    /// Mirror of `status == Applied`, kept for indexed lookups.
    pub applied: bool,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PlanChange {
    /// Whether this change may still be pushed upstream.
    pub fn can_be_applied(&self, plan_status: PlanStatus) -> bool {
        self.status != ChangeStatus::Rejected
            && self.status != ChangeStatus::Applied
            && plan_status.can_be_applied()
    }

    pub fn is_high_confidence(&self, threshold: f64) -> bool {
        self.confidence.is_some_and(|c| c >= threshold)
    }
}

/// Change payload as produced by analysis, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChange {
    pub scene_id: String,
    pub field: String,
    pub action: ChangeAction,
    pub current_value: Option<serde_json::Value>,
    pub proposed_value: serde_json::Value,
    pub confidence: Option<f64>,
}

/// Distribution of change statuses inside one plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub applied: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.applied
    }
}

/// Bulk review operation over a plan's pending changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BulkAction {
    AcceptAll,
    RejectAll,
    AcceptByField { field: String },
    RejectByField { field: String },
    AcceptByConfidence { min_confidence: f64 },
}

/// Outcome of applying a plan (or a subset of its changes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub total: usize,
    pub applied: usize,
    /// Changes finalized without an upstream write (scene missing upstream).
    pub skipped: usize,
    /// Changes that hit an upstream error and remain approved for retry.
    pub failed: usize,
    pub modified_scene_ids: BTreeSet<String>,
}

impl ApplyResult {
    /// Render as a job result map.
    pub fn to_json_map(&self) -> JsonMap {
        let mut map = JsonMap::new();
        map.insert("total".into(), self.total.into());
        map.insert("applied".into(), self.applied.into());
        map.insert("skipped".into(), self.skipped.into());
        map.insert("failed".into(), self.failed.into());
        map.insert(
            "modified_scene_ids".into(),
            self.modified_scene_ids.iter().cloned().collect::<Vec<_>>().into(),
        );
        map
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
