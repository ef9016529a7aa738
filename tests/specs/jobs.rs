// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job engine specs: sequential analysis jobs and queued-job cancellation.

use super::prelude::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use stashhog_core::{JobStatus, JsonMap as Map};
use stashhog_engine::{JobContext, JobError, JobHandler};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Analysis handler that sleeps briefly and logs its execution window.
struct SleepyAnalysis {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl JobHandler for SleepyAnalysis {
    async fn run(&self, ctx: JobContext) -> Result<Map, JobError> {
        self.log.lock().push(format!("{}_start", ctx.job_id));
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.log.lock().push(format!("{}_end", ctx.job_id));
        let mut result = Map::new();
        result.insert("analyzed".into(), 1.into());
        Ok(result)
    }
}

/// Analysis handler that holds the analysis lock until released.
struct GatedAnalysis {
    gate: Arc<Notify>,
}

#[async_trait]
impl JobHandler for GatedAnalysis {
    async fn run(&self, _ctx: JobContext) -> Result<Map, JobError> {
        self.gate.notified().await;
        Ok(Map::new())
    }
}

fn analysis_params() -> JobParams {
    JobParams::Analysis { scene_ids: vec!["scene-1".into()], plan_name: None }
}

// Three simultaneous analysis jobs run one at a time.
#[tokio::test]
async fn sequential_analysis_jobs() {
    let t = spawn_app();
    let log: Arc<Mutex<Vec<String>>> = Arc::default();
    t.app
        .jobs
        .register(JobType::Analysis, Arc::new(SleepyAnalysis { log: Arc::clone(&log) }));

    let mut ids = Vec::new();
    for _ in 0..3 {
        let job = t
            .app
            .jobs
            .create_job(JobType::Analysis, analysis_params(), JsonMap::new())
            .await
            .unwrap();
        ids.push(job.id);
    }
    for id in &ids {
        let done = wait_for_status(&t.app.store, id, JobStatus::Completed).await;
        assert_eq!(done.result.as_ref().unwrap()["analyzed"], 1);
    }

    // Strict alternation of start/end proves the RUNNING intervals never
    // overlapped.
    let events = log.lock().clone();
    assert_eq!(events.len(), 6);
    for (idx, event) in events.iter().enumerate() {
        let expected = if idx % 2 == 0 { "_start" } else { "_end" };
        assert!(event.ends_with(expected), "unexpected interleaving: {events:?}");
    }
}

// Cancelling a job queued behind the analysis lock.
#[tokio::test]
async fn cancel_queued_analysis_job() {
    let t = spawn_app();
    let gate = Arc::new(Notify::new());
    t.app
        .jobs
        .register(JobType::Analysis, Arc::new(GatedAnalysis { gate: Arc::clone(&gate) }));

    let first = t
        .app
        .jobs
        .create_job(JobType::Analysis, analysis_params(), JsonMap::new())
        .await
        .unwrap();
    wait_for_status(&t.app.store, &first.id, JobStatus::Running).await;

    let second = t
        .app
        .jobs
        .create_job(JobType::Analysis, analysis_params(), JsonMap::new())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(t.app.store.job(&second.id).unwrap().status, JobStatus::Pending);

    assert!(t.app.jobs.cancel_job(&second.id).await.unwrap());
    let cancelled = wait_for_status(&t.app.store, &second.id, JobStatus::Cancelled).await;
    assert_eq!(cancelled.error.as_deref(), Some("Cancelled by user"));

    // The lock holder is unaffected and still finishes normally.
    assert_eq!(t.app.store.job(&first.id).unwrap().status, JobStatus::Running);
    gate.notify_one();
    wait_for_status(&t.app.store, &first.id, JobStatus::Completed).await;
}

// The built-in TEST handler cooperates with cancellation mid-run.
#[tokio::test]
async fn running_test_job_cancels_cooperatively() {
    let t = spawn_app();
    let job = t
        .app
        .jobs
        .create_job(
            JobType::Test,
            JobParams::Test { steps: 50, step_delay_ms: 20, fail_at_step: None },
            JsonMap::new(),
        )
        .await
        .unwrap();
    wait_for_status(&t.app.store, &job.id, JobStatus::Running).await;

    assert!(t.app.jobs.cancel_job(&job.id).await.unwrap());
    let done = wait_for_status(&t.app.store, &job.id, JobStatus::Cancelled).await;
    assert_eq!(done.error.as_deref(), Some("Cancelled by user"));
}
