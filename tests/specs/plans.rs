// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan lifecycle specs: auto-apply of empty plans and partial apply with
//! missing upstream scenes.

use super::prelude::*;
use stashhog_core::test_support::tag_add_change;
use stashhog_core::{BulkAction, ChangeStatus, JobStatus, PlanStatus};

// A plan finalized with zero changes auto-applies.
#[tokio::test]
async fn empty_plan_auto_applies() {
    let t = spawn_app();
    let plan = t.app.plans.create_plan("p", None, JsonMap::new(), None).unwrap();
    assert_eq!(plan.status, PlanStatus::Pending);

    let finalized = t.app.plans.finalize_plan(plan.id, JsonMap::new()).unwrap();
    assert_eq!(finalized.status, PlanStatus::Applied);
    assert!(finalized.applied_at.is_some());
    assert_eq!(finalized.metadata["reason"], "No changes detected");
}

// Partial apply with a scene missing upstream.
#[tokio::test]
async fn partial_apply_with_missing_scene() {
    let t = spawn_app();
    t.fake.seed_scene("A", "Scene A");
    t.fake.seed_scene("C", "Scene C");
    // Scene "B" does not exist upstream.

    let plan = t.app.plans.create_plan("p", None, JsonMap::new(), None).unwrap();
    let appender = t.app.plans.appender(plan.id);
    appender
        .append(vec![
            tag_add_change("A", "verified"),
            tag_add_change("B", "verified"),
            tag_add_change("C", "verified"),
        ])
        .await
        .unwrap();
    t.app.plans.finalize_plan(plan.id, JsonMap::new()).unwrap();
    t.app.plans.bulk_update_changes(plan.id, None, BulkAction::AcceptAll).unwrap();

    let result = t.app.plans.apply_plan(plan.id, None).await.unwrap();
    assert_eq!(result.total, 3);
    assert_eq!(result.applied, 2);
    assert_eq!(result.skipped, 1);
    assert_eq!(result.failed, 0);
    assert_eq!(
        result.modified_scene_ids.iter().cloned().collect::<Vec<_>>(),
        vec!["A".to_string(), "C".to_string()]
    );

    for change in t.app.plans.changes(plan.id) {
        assert_eq!(change.status, ChangeStatus::Applied);
        assert!(change.applied_at.is_some());
    }
    assert_eq!(t.app.plans.plan(plan.id).unwrap().status, PlanStatus::Applied);
}

// The APPLY_PLAN job wraps the same flow and reports the result map.
#[tokio::test]
async fn apply_plan_job_end_to_end() {
    let t = spawn_app();
    t.fake.seed_scene("A", "Scene A");

    let plan = t.app.plans.create_plan("p", None, JsonMap::new(), None).unwrap();
    t.app
        .plans
        .appender(plan.id)
        .append(vec![tag_add_change("A", "verified")])
        .await
        .unwrap();
    t.app.plans.finalize_plan(plan.id, JsonMap::new()).unwrap();
    t.app.plans.bulk_update_changes(plan.id, None, BulkAction::AcceptAll).unwrap();

    let job = t
        .app
        .jobs
        .create_job(
            JobType::ApplyPlan,
            JobParams::ApplyPlan { plan_id: plan.id, change_ids: None },
            JsonMap::new(),
        )
        .await
        .unwrap();
    let done = wait_for_status(&t.app.store, &job.id, JobStatus::Completed).await;

    let result = done.result.unwrap();
    assert_eq!(result["applied"], 1);
    assert_eq!(result["plan_id"], plan.id);
    assert_eq!(t.app.plans.plan(plan.id).unwrap().status, PlanStatus::Applied);
}
