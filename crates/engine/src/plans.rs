// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan manager: the AnalysisPlan lifecycle.
//!
//! Plans are built incrementally: created PENDING before analysis produces
//! anything, changes streamed in batches while it runs, then finalized to
//! DRAFT (or straight to APPLIED when nothing was found). Review moves the
//! plan to REVIEWING; applying approved changes upstream ends it at APPLIED.

use crate::error::JobError;
use crate::translate;
use parking_lot::Mutex;
use stashhog_core::{
    AnalysisPlan, ApplyResult, BulkAction, ChangeStatus, JobId, JsonMap, NewChange, PlanChange,
    PlanStatus, NO_CHANGES_REASON, PLAN_META_REASON,
};
use stashhog_stash::StashApi;
use stashhog_storage::Store;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

/// Shared plan-manager handle.
#[derive(Clone)]
pub struct PlanManager {
    store: Store,
    api: Arc<dyn StashApi>,
    /// Per-plan append serialization.
    appenders: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

/// Batch appender bound to one plan.
///
/// Appends within one plan are serialized; handlers stream batches through
/// this while the plan is PENDING.
pub struct PlanAppender {
    manager: PlanManager,
    plan_id: i64,
}

impl PlanAppender {
    pub fn plan_id(&self) -> i64 {
        self.plan_id
    }

    /// Append a batch of proposed changes, each starting PENDING.
    pub async fn append(&self, changes: Vec<NewChange>) -> Result<Vec<PlanChange>, JobError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        let lock = self.manager.append_lock(self.plan_id);
        let _guard = lock.lock().await;
        let plan = self
            .manager
            .store
            .plan(self.plan_id)
            .ok_or_else(|| JobError::NotFound(format!("plan {}", self.plan_id)))?;
        if plan.status != PlanStatus::Pending {
            return Err(JobError::Validation(format!(
                "plan {} is no longer accepting changes ({})",
                self.plan_id, plan.status
            )));
        }
        Ok(self.manager.store.append_changes(self.plan_id, changes)?)
    }
}

impl PlanManager {
    pub fn new(store: Store, api: Arc<dyn StashApi>) -> Self {
        Self { store, api, appenders: Arc::new(Mutex::new(HashMap::new())) }
    }

    fn append_lock(&self, plan_id: i64) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.appenders.lock().entry(plan_id).or_default())
    }

    /// Create a plan in PENDING, ready to receive streamed changes.
    pub fn create_plan(
        &self,
        name: &str,
        description: Option<&str>,
        metadata: JsonMap,
        job_id: Option<JobId>,
    ) -> Result<AnalysisPlan, JobError> {
        let plan = self.store.create_plan(name, description, metadata, job_id)?;
        info!(plan_id = plan.id, name, "created analysis plan");
        Ok(plan)
    }

    /// The serialized appender for one plan.
    pub fn appender(&self, plan_id: i64) -> PlanAppender {
        PlanAppender { manager: self.clone(), plan_id }
    }

    pub fn plan(&self, id: i64) -> Option<AnalysisPlan> {
        self.store.plan(id)
    }

    pub fn changes(&self, plan_id: i64) -> Vec<PlanChange> {
        self.store.plan_changes(plan_id)
    }

    /// Close out plan construction.
    ///
    /// A plan that produced no changes auto-applies with a recorded reason;
    /// otherwise it becomes DRAFT awaiting review.
    pub fn finalize_plan(&self, plan_id: i64, stats: JsonMap) -> Result<AnalysisPlan, JobError> {
        let plan = self
            .store
            .plan(plan_id)
            .ok_or_else(|| JobError::NotFound(format!("plan {plan_id}")))?;
        if plan.status != PlanStatus::Pending {
            return Err(JobError::Validation(format!(
                "plan {plan_id} is not being built ({})",
                plan.status
            )));
        }

        if !stats.is_empty() {
            self.store.merge_plan_metadata(plan_id, stats)?;
        }

        let count = self.store.change_counts(plan_id).total();
        let updated = if count == 0 {
            let mut reason = JsonMap::new();
            reason.insert(PLAN_META_REASON.to_string(), NO_CHANGES_REASON.into());
            self.store.merge_plan_metadata(plan_id, reason)?;
            let now = self.store.clock().utc_now();
            info!(plan_id, "plan finalized with no changes, auto-applied");
            self.store.set_plan_status(plan_id, PlanStatus::Applied, Some(now))?
        } else {
            info!(plan_id, changes = count, "plan finalized as draft");
            self.store.set_plan_status(plan_id, PlanStatus::Draft, None)?
        };
        Ok(updated)
    }

    /// Review one change.
    ///
    /// Legal transitions: PENDING↔APPROVED and PENDING↔REJECTED. APPLIED is
    /// only reachable through [`apply_plan`].
    ///
    /// [`apply_plan`]: PlanManager::apply_plan
    pub fn update_change_status(
        &self,
        change_id: i64,
        new_status: ChangeStatus,
    ) -> Result<PlanChange, JobError> {
        let change = self
            .store
            .change(change_id)
            .ok_or_else(|| JobError::NotFound(format!("change {change_id}")))?;

        if change.status == new_status {
            return Ok(change);
        }
        let legal = matches!(
            (change.status, new_status),
            (ChangeStatus::Pending, ChangeStatus::Approved)
                | (ChangeStatus::Pending, ChangeStatus::Rejected)
                | (ChangeStatus::Approved, ChangeStatus::Pending)
                | (ChangeStatus::Rejected, ChangeStatus::Pending)
        );
        if !legal {
            return Err(JobError::Validation(format!(
                "illegal change transition {} -> {}",
                change.status, new_status
            )));
        }

        let updated = self.store.set_change_status(change_id, new_status, None)?;
        self.reconcile_status(change.plan_id)?;
        Ok(updated)
    }

    /// Bulk-review a plan's PENDING changes; returns how many were touched.
    pub fn bulk_update_changes(
        &self,
        plan_id: i64,
        scene_id: Option<&str>,
        action: BulkAction,
    ) -> Result<usize, JobError> {
        if self.store.plan(plan_id).is_none() {
            return Err(JobError::NotFound(format!("plan {plan_id}")));
        }

        let pending: Vec<PlanChange> = self
            .store
            .plan_changes(plan_id)
            .into_iter()
            .filter(|c| c.status == ChangeStatus::Pending)
            .filter(|c| scene_id.is_none_or(|s| c.scene_id == s))
            .collect();

        let mut touched = 0;
        for change in pending {
            let target = match &action {
                BulkAction::AcceptAll => Some(ChangeStatus::Approved),
                BulkAction::RejectAll => Some(ChangeStatus::Rejected),
                BulkAction::AcceptByField { field } => {
                    (change.field == *field).then_some(ChangeStatus::Approved)
                }
                BulkAction::RejectByField { field } => {
                    (change.field == *field).then_some(ChangeStatus::Rejected)
                }
                BulkAction::AcceptByConfidence { min_confidence } => change
                    .is_high_confidence(*min_confidence)
                    .then_some(ChangeStatus::Approved),
            };
            if let Some(status) = target {
                self.store.set_change_status(change.id, status, None)?;
                touched += 1;
            }
        }

        if touched > 0 {
            self.reconcile_status(plan_id)?;
        }
        Ok(touched)
    }

    /// Push approved changes upstream.
    ///
    /// The candidate set is `change_ids` when given, otherwise every
    /// APPROVED change, never PENDING or REJECTED ones. A scene missing
    /// upstream counts as *skipped* and the change is finalized so it stops
    /// blocking plan progress; an upstream error counts as *failed* and the
    /// change stays APPROVED for retry.
    pub async fn apply_plan(
        &self,
        plan_id: i64,
        change_ids: Option<Vec<i64>>,
    ) -> Result<ApplyResult, JobError> {
        let plan = self
            .store
            .plan(plan_id)
            .ok_or_else(|| JobError::NotFound(format!("plan {plan_id}")))?;
        if !plan.can_be_applied() {
            return Err(JobError::Validation(format!(
                "plan {plan_id} cannot be applied in status {}",
                plan.status
            )));
        }

        let candidates: Vec<PlanChange> = match change_ids {
            Some(ids) => {
                let mut selected = Vec::with_capacity(ids.len());
                for id in ids {
                    let change = self
                        .store
                        .change(id)
                        .filter(|c| c.plan_id == plan_id)
                        .ok_or_else(|| {
                            JobError::NotFound(format!("change {id} in plan {plan_id}"))
                        })?;
                    if change.can_be_applied(plan.status) {
                        selected.push(change);
                    }
                }
                selected
            }
            None => self
                .store
                .plan_changes(plan_id)
                .into_iter()
                .filter(|c| c.status == ChangeStatus::Approved)
                .collect(),
        };

        let mut result = ApplyResult { total: candidates.len(), ..Default::default() };

        for change in candidates {
            let now = self.store.clock().utc_now();
            match self.api.get_scene(&change.scene_id).await {
                Ok(None) => {
                    // Scene vanished upstream: finalize the change without a
                    // write so the plan can still complete.
                    warn!(
                        plan_id,
                        change_id = change.id,
                        scene_id = %change.scene_id,
                        "scene missing upstream, skipping change"
                    );
                    self.store.set_change_status(change.id, ChangeStatus::Applied, Some(now))?;
                    result.skipped += 1;
                }
                Ok(Some(scene)) => {
                    let applied = match translate::build_patch(self.api.as_ref(), &scene, &change)
                        .await
                    {
                        Ok(patch) => match self.api.update_scene(&patch).await {
                            Ok(()) => true,
                            Err(e) => {
                                warn!(
                                    plan_id,
                                    change_id = change.id,
                                    error = %e,
                                    "upstream update failed, change stays approved"
                                );
                                false
                            }
                        },
                        Err(e) => {
                            warn!(
                                plan_id,
                                change_id = change.id,
                                error = %e,
                                "change could not be translated, stays approved"
                            );
                            false
                        }
                    };
                    if applied {
                        self.store.set_change_status(
                            change.id,
                            ChangeStatus::Applied,
                            Some(now),
                        )?;
                        result.applied += 1;
                        result.modified_scene_ids.insert(change.scene_id.clone());
                    } else {
                        result.failed += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        plan_id,
                        change_id = change.id,
                        error = %e,
                        "upstream lookup failed, change stays approved"
                    );
                    result.failed += 1;
                }
            }
        }

        self.reconcile_status(plan_id)?;
        info!(
            plan_id,
            applied = result.applied,
            skipped = result.skipped,
            failed = result.failed,
            "plan apply finished"
        );
        Ok(result)
    }

    /// Recompute plan status from its change-status counts.
    ///
    /// DRAFT moves to REVIEWING once any review decision exists; a plan with
    /// no pending and no approved-unapplied changes and at least one applied
    /// change becomes APPLIED.
    pub fn reconcile_status(&self, plan_id: i64) -> Result<AnalysisPlan, JobError> {
        let plan = self
            .store
            .plan(plan_id)
            .ok_or_else(|| JobError::NotFound(format!("plan {plan_id}")))?;
        let counts = self.store.change_counts(plan_id);

        let mut current = plan.clone();
        if current.status == PlanStatus::Draft && counts.approved + counts.rejected > 0 {
            current = self.store.set_plan_status(plan_id, PlanStatus::Reviewing, None)?;
        }

        if counts.pending == 0
            && counts.approved == 0
            && counts.applied > 0
            && current.status != PlanStatus::Applied
            && current.status != PlanStatus::Cancelled
        {
            let applied_at = current.applied_at.is_none().then(|| self.store.clock().utc_now());
            current = self.store.set_plan_status(plan_id, PlanStatus::Applied, applied_at)?;
        }
        Ok(current)
    }

    /// Abandon a plan that is still in progress or under review.
    pub fn cancel_plan(&self, plan_id: i64) -> Result<AnalysisPlan, JobError> {
        let plan = self
            .store
            .plan(plan_id)
            .ok_or_else(|| JobError::NotFound(format!("plan {plan_id}")))?;
        match plan.status {
            PlanStatus::Pending | PlanStatus::Draft | PlanStatus::Reviewing => {
                Ok(self.store.set_plan_status(plan_id, PlanStatus::Cancelled, None)?)
            }
            other => Err(JobError::Validation(format!(
                "plan {plan_id} cannot be cancelled in status {other}"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "plans_tests.rs"]
mod tests;
