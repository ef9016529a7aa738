// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    pending = { PlanStatus::Pending, false },
    draft = { PlanStatus::Draft, true },
    reviewing = { PlanStatus::Reviewing, true },
    applied = { PlanStatus::Applied, false },
    cancelled = { PlanStatus::Cancelled, false },
)]
fn plan_apply_eligibility(status: PlanStatus, expected: bool) {
    assert_eq!(status.can_be_applied(), expected);
}

#[test]
fn plan_status_serializes_uppercase() {
    assert_eq!(serde_json::to_string(&PlanStatus::Reviewing).unwrap(), "\"REVIEWING\"");
    assert_eq!(serde_json::to_string(&ChangeStatus::Approved).unwrap(), "\"approved\"");
}

fn change(status: ChangeStatus) -> PlanChange {
    PlanChange {
        id: 1,
        plan_id: 1,
        scene_id: "scene-1".into(),
        field: "tags".into(),
        action: ChangeAction::Add,
        current_value: None,
        proposed_value: serde_json::json!({"name": "outdoors"}),
        confidence: Some(0.9),
        status,
        applied: status == ChangeStatus::Applied,
        applied_at: None,
        created_at: chrono::Utc::now(),
    }
}

#[parameterized(
    pending_in_draft = { ChangeStatus::Pending, PlanStatus::Draft, true },
    approved_in_reviewing = { ChangeStatus::Approved, PlanStatus::Reviewing, true },
    rejected = { ChangeStatus::Rejected, PlanStatus::Reviewing, false },
    already_applied = { ChangeStatus::Applied, PlanStatus::Reviewing, false },
    plan_not_reviewable = { ChangeStatus::Approved, PlanStatus::Applied, false },
)]
fn change_apply_eligibility(status: ChangeStatus, plan: PlanStatus, expected: bool) {
    assert_eq!(change(status).can_be_applied(plan), expected);
}

#[test]
fn confidence_threshold() {
    let c = change(ChangeStatus::Pending);
    assert!(c.is_high_confidence(0.8));
    assert!(!c.is_high_confidence(0.95));
}

#[test]
fn change_counts_total() {
    let counts = ChangeCounts { pending: 1, approved: 2, rejected: 3, applied: 4 };
    assert_eq!(counts.total(), 10);
}

#[test]
fn apply_result_renders_scene_ids_in_order() {
    let mut result = ApplyResult { total: 3, applied: 2, skipped: 1, ..Default::default() };
    result.modified_scene_ids.insert("b".into());
    result.modified_scene_ids.insert("a".into());
    let map = result.to_json_map();
    assert_eq!(map["modified_scene_ids"], serde_json::json!(["a", "b"]));
    assert_eq!(map["skipped"], 1);
}
