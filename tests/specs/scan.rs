// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream-driven job specs: cancelling a STASH_SCAN job.

use super::prelude::*;
use stashhog_core::JobStatus;
use stashhog_stash::StashJobStatus;
use std::time::Duration;

// Cancelling a scan requests exactly one upstream stop and then
// follows the upstream to its terminal state.
#[tokio::test(start_paused = true)]
async fn cancelling_scan_stops_upstream_job_once() {
    let t = spawn_app();
    let job = t
        .app
        .jobs
        .create_job(
            JobType::StashScan,
            JobParams::Scan { paths: vec!["/data".into()], rescan: false },
            JsonMap::new(),
        )
        .await
        .unwrap();
    wait_for_status(&t.app.store, &job.id, JobStatus::Running).await;

    // Let the poller take at least one tick against the running upstream
    // job, then cancel locally.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(t.app.jobs.cancel_job(&job.id).await.unwrap());
    assert_eq!(t.app.store.job(&job.id).unwrap().status, JobStatus::Cancelling);

    // The upstream acknowledges slowly: several polls observe STOPPING.
    tokio::time::sleep(Duration::from_secs(8)).await;
    assert_eq!(t.fake.stop_request_count("stash-job-1"), 1);
    t.fake.set_job_status("stash-job-1", StashJobStatus::Cancelled, 0.4);

    let done = wait_for_status(&t.app.store, &job.id, JobStatus::Cancelled).await;
    assert_eq!(done.error.as_deref(), Some("Cancelled by user"));
    assert_eq!(done.last_message(), Some("Stash scan was cancelled upstream"));
    // Still exactly one stop request after all the STOPPING polls.
    assert_eq!(t.fake.stop_request_count("stash-job-1"), 1);
}

#[tokio::test(start_paused = true)]
async fn scan_job_completes_with_upstream() {
    let t = spawn_app();
    let job = t
        .app
        .jobs
        .create_job(
            JobType::StashScan,
            JobParams::Scan { paths: vec!["/data".into()], rescan: false },
            JsonMap::new(),
        )
        .await
        .unwrap();
    wait_for_status(&t.app.store, &job.id, JobStatus::Running).await;

    tokio::time::sleep(Duration::from_secs(3)).await;
    t.fake.set_job_status("stash-job-1", StashJobStatus::Finished, 1.0);

    let done = wait_for_status(&t.app.store, &job.id, JobStatus::Completed).await;
    let result = done.result.unwrap();
    assert_eq!(result["stash_job_id"], "stash-job-1");
    assert_eq!(result["status"], "completed");
}
