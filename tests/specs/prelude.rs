// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the scenario specs.

use std::sync::Arc;
use std::time::Duration;

use stashhog_core::{JobId, JobStatus, SystemClock};
use stashhog_daemon::{bootstrap, App, Config};
use stashhog_stash::FakeStash;
use stashhog_storage::Store;

pub use stashhog_core::{JobParams, JobType, JsonMap};

/// A full in-process deployment over a throwaway state directory.
pub struct TestApp {
    pub app: App,
    pub fake: Arc<FakeStash>,
    _state_dir: tempfile::TempDir,
}

/// Build the composition root with a fake upstream.
pub fn spawn_app() -> TestApp {
    let state_dir = tempfile::tempdir().expect("tempdir");
    let config = Config::for_state_dir(state_dir.path()).expect("config");
    let fake = Arc::new(FakeStash::new());
    let app = bootstrap::build_with_api(config, fake.clone(), Arc::new(SystemClock))
        .expect("bootstrap");
    TestApp { app, fake, _state_dir: state_dir }
}

/// Poll until the job reaches the wanted status.
pub async fn wait_for_status(
    store: &Store,
    id: &JobId,
    status: JobStatus,
) -> stashhog_core::Job {
    for _ in 0..2000 {
        if let Some(job) = store.job(id) {
            if job.status == status {
                return job;
            }
            assert!(
                !(job.status.is_terminal() && job.status != status),
                "job {id} ended {} while waiting for {status}",
                job.status
            );
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never reached {status}");
}
