// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan and change tables: apply functions and query paths.

use super::MaterializedState;
use stashhog_core::{AnalysisPlan, ChangeCounts, ChangeStatus, Event, PlanChange, PlanStatus};

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::PlanCreated { plan } => {
            state.next_plan_id = state.next_plan_id.max(plan.id + 1);
            state.plans.entry(plan.id).or_insert_with(|| plan.clone());
        }

        Event::PlanChangesAppended { plan_id: _, changes } => {
            for change in changes {
                state.next_change_id = state.next_change_id.max(change.id + 1);
                state.changes.entry(change.id).or_insert_with(|| change.clone());
            }
        }

        Event::PlanMetadataMerged { id, entries } => {
            if let Some(plan) = state.plans.get_mut(id) {
                for (key, value) in entries {
                    plan.metadata.insert(key.clone(), value.clone());
                }
            }
        }

        Event::PlanStatusChanged { id, status, applied_at } => {
            if let Some(plan) = state.plans.get_mut(id) {
                plan.status = *status;
                if applied_at.is_some() {
                    plan.applied_at = *applied_at;
                }
            }
        }

        Event::ChangeStatusChanged { id, status, applied_at } => {
            if let Some(change) = state.changes.get_mut(id) {
                change.status = *status;
                change.applied = *status == ChangeStatus::Applied;
                if applied_at.is_some() {
                    change.applied_at = *applied_at;
                }
            }
        }

        _ => {}
    }
}

impl MaterializedState {
    pub fn plan(&self, id: i64) -> Option<&AnalysisPlan> {
        self.plans.get(&id)
    }

    pub fn change(&self, id: i64) -> Option<&PlanChange> {
        self.changes.get(&id)
    }

    /// Changes of one plan in insertion order.
    pub fn plan_changes(&self, plan_id: i64) -> Vec<&PlanChange> {
        self.changes.values().filter(|c| c.plan_id == plan_id).collect()
    }

    /// Status distribution of one plan's changes.
    pub fn change_counts(&self, plan_id: i64) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        for change in self.changes.values().filter(|c| c.plan_id == plan_id) {
            match change.status {
                ChangeStatus::Pending => counts.pending += 1,
                ChangeStatus::Approved => counts.approved += 1,
                ChangeStatus::Rejected => counts.rejected += 1,
                ChangeStatus::Applied => counts.applied += 1,
            }
        }
        counts
    }

    /// Plans sorted newest-first, optionally filtered by status.
    pub fn plans_sorted(&self, status: Option<PlanStatus>) -> Vec<&AnalysisPlan> {
        let mut rows: Vec<&AnalysisPlan> = self
            .plans
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows
    }
}
