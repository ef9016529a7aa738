// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::contract::DaemonContext;
use async_trait::async_trait;
use stashhog_core::{
    DaemonJobAction, DaemonRecord, JobStatus, JsonMap, SyncCounters, SyncEntityType,
    SyncRunStatus, SystemClock,
};
use stashhog_engine::{
    EventBus, JobContext, JobError, JobHandler, JobService, TaskRunner,
};
use stashhog_stash::{FakeStash, DEFAULT_UPSTREAM_TIMEZONE};
use stashhog_storage::Store;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// SYNC handler that blocks until released.
struct GatedSyncHandler {
    gate: Arc<Notify>,
}

#[async_trait]
impl JobHandler for GatedSyncHandler {
    async fn run(&self, _ctx: JobContext) -> Result<stashhog_core::JsonMap, JobError> {
        self.gate.notified().await;
        Ok(stashhog_core::JsonMap::new())
    }
}

struct Fixture {
    store: Store,
    fake: Arc<FakeStash>,
    record: DaemonRecord,
    gate: Arc<Notify>,
    cancel: CancellationToken,
    ctx: DaemonContext,
}

fn fixture() -> Fixture {
    let store = Store::ephemeral(Arc::new(SystemClock)).unwrap();
    let bus = EventBus::new();
    let runner = TaskRunner::start(2);
    let jobs = JobService::new(store.clone(), bus.clone(), runner);

    let gate = Arc::new(Notify::new());
    jobs.register(JobType::Sync, Arc::new(GatedSyncHandler { gate: Arc::clone(&gate) }));

    let fake = Arc::new(FakeStash::new());
    let record = store.ensure_daemon("auto_stash_sync", DaemonKind::AutoStashSync).unwrap();

    let cancel = CancellationToken::new();
    let mut config = JsonMap::new();
    config.insert("heartbeat_interval".into(), 10.into());
    config.insert("job_interval_seconds".into(), 300.into());
    let ctx = DaemonContext::new(
        record.id,
        config,
        store.clone(),
        bus,
        jobs,
        cancel.clone(),
    );

    Fixture { store, fake, record, gate, cancel, ctx }
}

fn coordinator(f: &Fixture) -> Arc<SyncCoordinator> {
    let tz: chrono_tz::Tz = DEFAULT_UPSTREAM_TIMEZONE.parse().unwrap();
    Arc::new(SyncCoordinator::new(f.store.clone(), f.fake.clone(), tz))
}

fn seed_watermark(store: &Store) {
    let entry = store.begin_sync(SyncEntityType::Scene, None).unwrap();
    store
        .finish_sync(entry.id, SyncRunStatus::Completed, SyncCounters::default(), None)
        .unwrap();
}

async fn wait_until<F: Fn() -> bool>(what: &str, predicate: F) {
    for _ in 0..2000 {
        if predicate() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }
    panic!("timed out waiting for {what}");
}

fn sync_jobs(store: &Store) -> Vec<stashhog_core::Job> {
    store.list_jobs(&stashhog_storage::JobFilter {
        kind: Some(JobType::Sync),
        limit: Some(100),
        ..Default::default()
    })
}

#[tokio::test(start_paused = true)]
async fn pending_scenes_trigger_exactly_one_sync_job() {
    let f = fixture();
    seed_watermark(&f.store);
    f.fake.set_pending_count(5);

    let daemon = AutoStashSyncDaemon::new(coordinator(&f));
    let ctx = f.ctx.clone();
    let run = tokio::spawn(async move { daemon.run(&ctx).await });

    wait_until("sync job launched", || !sync_jobs(&f.store).is_empty()).await;

    let jobs = sync_jobs(&f.store);
    assert_eq!(jobs.len(), 1);
    match &jobs[0].parameters {
        JobParams::Sync { force, pending_scenes } => {
            assert!(!force);
            assert_eq!(*pending_scenes, Some(5));
        }
        other => panic!("unexpected params: {other:?}"),
    }

    let history = f.store.daemon_job_history(&f.record.id, 10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, DaemonJobAction::Launched);
    assert_eq!(history[0].job_id, jobs[0].id);

    // The handler is gated, so the job stays outstanding. Even well past the
    // configured interval no second job may be created.
    tokio::time::sleep(std::time::Duration::from_secs(900)).await;
    assert_eq!(sync_jobs(&f.store).len(), 1);

    // Heartbeats keep flowing while monitoring.
    assert!(f.store.daemon(&f.record.id).unwrap().last_heartbeat.is_some());

    // Release the job; the daemon records FINISHED and goes idle.
    f.fake.set_pending_count(0);
    f.gate.notify_one();
    wait_until("job finished", || {
        sync_jobs(&f.store)[0].status == JobStatus::Completed
    })
    .await;
    wait_until("finished tracked", || {
        f.store
            .daemon_job_history(&f.record.id, 10)
            .iter()
            .any(|h| h.action == DaemonJobAction::Finished)
    })
    .await;

    f.cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn no_pending_scenes_means_no_job() {
    let f = fixture();
    seed_watermark(&f.store);
    f.fake.set_pending_count(0);

    let daemon = AutoStashSyncDaemon::new(coordinator(&f));
    let ctx = f.ctx.clone();
    let run = tokio::spawn(async move { daemon.run(&ctx).await });

    // Let several check intervals pass.
    tokio::time::sleep(std::time::Duration::from_secs(1000)).await;
    assert!(sync_jobs(&f.store).is_empty());
    let logs = f.store.daemon_logs(&f.record.id, 50);
    assert!(logs.iter().any(|l| l.message == "No scenes pending sync from Stash"));

    f.cancel.cancel();
    run.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn upstream_errors_are_logged_and_retried() {
    let f = fixture();
    seed_watermark(&f.store);
    f.fake.set_find_scenes_error(true);

    let daemon = AutoStashSyncDaemon::new(coordinator(&f));
    let ctx = f.ctx.clone();
    let run = tokio::spawn(async move { daemon.run(&ctx).await });

    wait_until("error logged", || {
        f.store
            .daemon_logs(&f.record.id, 50)
            .iter()
            .any(|l| l.message.contains("Auto Stash Sync Daemon error"))
    })
    .await;
    assert_eq!(f.store.daemon_errors(&f.record.id).len(), 1);

    // Recovery: upstream comes back with pending work.
    f.fake.set_find_scenes_error(false);
    f.fake.set_pending_count(2);
    wait_until("job launched after recovery", || !sync_jobs(&f.store).is_empty()).await;

    f.cancel.cancel();
    run.await.unwrap().unwrap();
}
