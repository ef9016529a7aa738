// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use stashhog_core::test_support::tag_add_change;
use stashhog_core::{AnalysisPlan, PlanChange};

fn plan(id: i64) -> AnalysisPlan {
    AnalysisPlan {
        id,
        name: format!("plan-{id}"),
        description: None,
        metadata: JsonMap::new(),
        status: PlanStatus::Pending,
        job_id: None,
        created_at: Utc::now(),
        applied_at: None,
    }
}

fn change_row(id: i64, plan_id: i64) -> PlanChange {
    let new = tag_add_change("scene-1", "tag");
    PlanChange {
        id,
        plan_id,
        scene_id: new.scene_id,
        field: new.field,
        action: new.action,
        current_value: new.current_value,
        proposed_value: new.proposed_value,
        confidence: new.confidence,
        status: ChangeStatus::Pending,
        applied: false,
        applied_at: None,
        created_at: Utc::now(),
    }
}

#[test]
fn plan_creation_advances_next_id() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::PlanCreated { plan: plan(1) });
    assert_eq!(state.next_plan_id, 2);
    state.apply_event(&Event::PlanCreated { plan: plan(5) });
    assert_eq!(state.next_plan_id, 6);
}

#[test]
fn appended_changes_advance_next_change_id() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::PlanCreated { plan: plan(1) });
    state.apply_event(&Event::PlanChangesAppended {
        plan_id: 1,
        changes: vec![change_row(1, 1), change_row(2, 1)],
    });
    assert_eq!(state.next_change_id, 3);
    assert_eq!(state.plan_changes(1).len(), 2);
}

#[test]
fn change_status_sets_applied_mirror() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::PlanCreated { plan: plan(1) });
    state.apply_event(&Event::PlanChangesAppended { plan_id: 1, changes: vec![change_row(1, 1)] });

    let at = Utc::now();
    state.apply_event(&Event::ChangeStatusChanged {
        id: 1,
        status: ChangeStatus::Applied,
        applied_at: Some(at),
    });

    let change = state.change(1).unwrap();
    assert!(change.applied);
    assert_eq!(change.applied_at, Some(at));
    assert_eq!(change.status, ChangeStatus::Applied);
}

#[test]
fn change_counts_reflect_statuses() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::PlanCreated { plan: plan(1) });
    state.apply_event(&Event::PlanChangesAppended {
        plan_id: 1,
        changes: (1..=4).map(|id| change_row(id, 1)).collect(),
    });
    state.apply_event(&Event::ChangeStatusChanged {
        id: 1,
        status: ChangeStatus::Approved,
        applied_at: None,
    });
    state.apply_event(&Event::ChangeStatusChanged {
        id: 2,
        status: ChangeStatus::Rejected,
        applied_at: None,
    });

    let counts = state.change_counts(1);
    assert_eq!(counts.pending, 2);
    assert_eq!(counts.approved, 1);
    assert_eq!(counts.rejected, 1);
    assert_eq!(counts.total(), 4);
}

#[test]
fn metadata_merge_overwrites_keys() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::PlanCreated { plan: plan(1) });
    let mut entries = JsonMap::new();
    entries.insert("reason".into(), "No changes detected".into());
    state.apply_event(&Event::PlanMetadataMerged { id: 1, entries });

    let plan = state.plan(1).unwrap();
    assert_eq!(plan.metadata["reason"], "No changes detected");
}

#[test]
fn plan_status_transition_stamps_applied_at_once() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::PlanCreated { plan: plan(1) });

    let at = Utc::now();
    state.apply_event(&Event::PlanStatusChanged {
        id: 1,
        status: PlanStatus::Applied,
        applied_at: Some(at),
    });
    state.apply_event(&Event::PlanStatusChanged {
        id: 1,
        status: PlanStatus::Applied,
        applied_at: None,
    });

    assert_eq!(state.plan(1).unwrap().applied_at, Some(at));
}

#[test]
fn changes_of_other_plans_are_not_mixed_in() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::PlanCreated { plan: plan(1) });
    state.apply_event(&Event::PlanCreated { plan: plan(2) });
    state.apply_event(&Event::PlanChangesAppended { plan_id: 1, changes: vec![change_row(1, 1)] });
    state.apply_event(&Event::PlanChangesAppended { plan_id: 2, changes: vec![change_row(2, 2)] });

    assert_eq!(state.plan_changes(1).len(), 1);
    assert_eq!(state.change_counts(2).pending, 1);
}
