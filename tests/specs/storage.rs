// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durability specs: job rows survive a process restart; in-flight jobs are
//! reported stale, not resumed.

use super::prelude::*;
use std::sync::Arc;
use stashhog_core::{JobStatus, SystemClock};
use stashhog_daemon::{bootstrap, Config};
use stashhog_stash::FakeStash;

#[tokio::test]
async fn jobs_survive_restart_and_stale_ones_are_reported() {
    let state_dir = tempfile::tempdir().unwrap();

    let (done_id, wedged_id) = {
        let config = Config::for_state_dir(state_dir.path()).unwrap();
        let fake = Arc::new(FakeStash::new());
        let app =
            bootstrap::build_with_api(config, fake, Arc::new(SystemClock)).unwrap();

        let done = app
            .jobs
            .create_job(
                JobType::Test,
                JobParams::Test { steps: 1, step_delay_ms: 1, fail_at_step: None },
                JsonMap::new(),
            )
            .await
            .unwrap();
        wait_for_status(&app.store, &done.id, JobStatus::Completed).await;

        // Simulate a crash mid-flight: a RUNNING row with no surviving task.
        let wedged = app.store.create_job(JobType::Sync, JobParams::Empty, JsonMap::new()).unwrap();
        app.store
            .update_job_status(&wedged.id, JobStatus::Running, Default::default())
            .unwrap();
        app.store.flush().unwrap();
        (done.id, wedged.id)
    };

    // "Restart": a fresh composition root over the same state directory.
    let config = Config::for_state_dir(state_dir.path()).unwrap();
    let fake = Arc::new(FakeStash::new());
    let app = bootstrap::build_with_api(config, fake, Arc::new(SystemClock)).unwrap();

    let done = app.store.job(&done_id).unwrap();
    assert_eq!(done.status, JobStatus::Completed);

    // The crashed job is visible as stale RUNNING, not resumed and not failed
    // eagerly.
    let stale = app.store.stale_jobs();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, wedged_id);
    assert_eq!(stale[0].status, JobStatus::Running);
}
