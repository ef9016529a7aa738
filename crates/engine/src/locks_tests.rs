// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use stashhog_core::JobType;

#[tokio::test]
async fn same_key_returns_same_lock() {
    let locks = TypeLocks::new();
    let first = locks.handle("analysis");
    let _guard = first.lock().await;
    assert!(locks.is_held("analysis"));
    assert!(!locks.is_held("sync"));
}

#[tokio::test]
async fn analysis_family_contends_on_one_lock() {
    let locks = TypeLocks::new();
    let analysis_key = JobType::Analysis.lock_key().unwrap();
    let apply_key = JobType::ApplyPlan.lock_key().unwrap();
    assert_eq!(analysis_key, apply_key);

    let held = locks.handle(analysis_key);
    let _guard = held.lock().await;
    assert!(locks.handle(apply_key).try_lock().is_err());
}

#[tokio::test]
async fn different_groups_do_not_contend() {
    let locks = TypeLocks::new();
    let analysis = locks.handle(JobType::Analysis.lock_key().unwrap());
    let sync = locks.handle(JobType::SyncScenes.lock_key().unwrap());

    let _held = analysis.lock().await;
    assert!(sync.try_lock().is_ok());
}
