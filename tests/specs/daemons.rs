// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon specs: the auto sync daemon incremental trigger.

use super::prelude::*;
use stashhog_core::{DaemonJobAction, JobStatus, SyncCounters, SyncEntityType, SyncRunStatus};
use stashhog_storage::JobFilter;
use std::time::Duration;

// Pending upstream scenes produce exactly one SYNC job.
#[tokio::test]
async fn auto_sync_daemon_launches_one_incremental_sync() {
    let t = spawn_app();

    // Prior successful scene sync gives the daemon a watermark.
    let prior = t.app.store.begin_sync(SyncEntityType::Scene, None).unwrap();
    t.app
        .store
        .finish_sync(prior.id, SyncRunStatus::Completed, SyncCounters::default(), None)
        .unwrap();
    t.fake.set_pending_count(5);

    let record = t.app.store.daemon_by_name("auto_stash_sync").unwrap();
    t.app.supervisor.start(&record.id).await.unwrap();

    // Wait for the daemon to notice and launch.
    let job = 'outer: {
        for _ in 0..600 {
            let jobs = t.app.store.list_jobs(&JobFilter {
                kind: Some(JobType::Sync),
                ..Default::default()
            });
            if let Some(job) = jobs.into_iter().next() {
                break 'outer job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("auto sync daemon never launched a job")
    };

    match &job.parameters {
        JobParams::Sync { force, pending_scenes } => {
            assert!(!force);
            assert_eq!(*pending_scenes, Some(5));
        }
        other => panic!("unexpected sync params: {other:?}"),
    }

    let history = t.app.store.daemon_job_history(&record.id, 10);
    assert!(history
        .iter()
        .any(|h| h.action == DaemonJobAction::Launched && h.job_id == job.id));

    // No second SYNC job appears while the first is outstanding or shortly
    // after; the daemon waits out its interval first.
    wait_for_status(&t.app.store, &job.id, JobStatus::Completed).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let jobs = t.app.store.list_jobs(&JobFilter {
        kind: Some(JobType::Sync),
        ..Default::default()
    });
    assert_eq!(jobs.len(), 1);

    t.app.supervisor.stop(&record.id).await.unwrap();
}
