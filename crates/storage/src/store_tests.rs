// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use stashhog_core::test_support::tag_add_change;
use stashhog_core::FakeClock;
use std::time::Duration;

fn fake_clock() -> (Arc<FakeClock>, Arc<dyn Clock>) {
    let fake = Arc::new(FakeClock::new());
    let clock: Arc<dyn Clock> = fake.clone();
    (fake, clock)
}

fn open_store() -> (Store, Arc<FakeClock>) {
    let (fake, clock) = fake_clock();
    (Store::ephemeral(clock).unwrap(), fake)
}

#[test]
fn create_job_inserts_pending_row() {
    let (store, _) = open_store();
    let job = store.create_job(JobType::Sync, JobParams::Empty, JsonMap::new()).unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(store.job(&job.id).unwrap().id, job.id);
}

#[test]
fn first_running_transition_stamps_started_at() {
    let (store, fake) = open_store();
    let job = store.create_job(JobType::Sync, JobParams::Empty, JsonMap::new()).unwrap();

    fake.advance(Duration::from_secs(5));
    let updated = store
        .update_job_status(&job.id, JobStatus::Running, StatusUpdate::default())
        .unwrap()
        .unwrap();
    let started = updated.started_at.unwrap();
    assert_eq!(started, fake.utc_now());

    // A second RUNNING update must not move the stamp.
    fake.advance(Duration::from_secs(5));
    let updated = store
        .update_job_status(&job.id, JobStatus::Running, StatusUpdate::default().progress(50))
        .unwrap()
        .unwrap();
    assert_eq!(updated.started_at, Some(started));
}

#[test]
fn terminal_transition_stamps_completed_at_and_freezes_status() {
    let (store, fake) = open_store();
    let job = store.create_job(JobType::Sync, JobParams::Empty, JsonMap::new()).unwrap();
    store.update_job_status(&job.id, JobStatus::Running, StatusUpdate::default()).unwrap();

    fake.advance(Duration::from_secs(3));
    let done = store
        .update_job_status(
            &job.id,
            JobStatus::Completed,
            StatusUpdate::default().progress(100).result(JsonMap::new()),
        )
        .unwrap()
        .unwrap();
    assert_eq!(done.completed_at, Some(fake.utc_now()));
    assert!(done.started_at.unwrap() <= done.completed_at.unwrap());

    let frozen = store
        .update_job_status(&job.id, JobStatus::Failed, StatusUpdate::default().error("late"))
        .unwrap()
        .unwrap();
    assert_eq!(frozen.status, JobStatus::Completed);
    assert!(frozen.error.is_none());
}

#[test]
fn update_unknown_job_returns_none() {
    let (store, _) = open_store();
    let missing = store
        .update_job_status(&JobId::new(), JobStatus::Running, StatusUpdate::default())
        .unwrap();
    assert!(missing.is_none());
}

#[test]
fn list_jobs_pages_newest_first() {
    let (store, fake) = open_store();
    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(store.create_job(JobType::Test, JobParams::Empty, JsonMap::new()).unwrap().id);
        fake.advance(Duration::from_secs(1));
    }

    let page = store.list_jobs(&JobFilter { limit: Some(2), ..Default::default() });
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, ids[4]);

    let rest = store.list_jobs(&JobFilter { limit: Some(10), offset: 2, ..Default::default() });
    assert_eq!(rest.len(), 3);
    assert_eq!(rest[0].id, ids[2]);
}

#[test]
fn cleanup_removes_only_old_terminal_jobs() {
    let (store, fake) = open_store();
    let old = store.create_job(JobType::Test, JobParams::Empty, JsonMap::new()).unwrap();
    store.update_job_status(&old.id, JobStatus::Completed, StatusUpdate::default()).unwrap();

    fake.advance(Duration::from_secs(60 * 60 * 24 * 40));
    let recent = store.create_job(JobType::Test, JobParams::Empty, JsonMap::new()).unwrap();
    store.update_job_status(&recent.id, JobStatus::Failed, StatusUpdate::default().error("x")).unwrap();
    let active = store.create_job(JobType::Test, JobParams::Empty, JsonMap::new()).unwrap();

    let cutoff = fake.utc_now() - chrono::Duration::days(30);
    let removed = store.cleanup_old_jobs(cutoff).unwrap();
    assert_eq!(removed, 1);
    assert!(store.job(&old.id).is_none());
    assert!(store.job(&recent.id).is_some());
    assert!(store.job(&active.id).is_some());
}

#[test]
fn stale_jobs_are_reported_and_failable() {
    let (store, fake) = open_store();
    let wedged = store.create_job(JobType::Sync, JobParams::Empty, JsonMap::new()).unwrap();
    store.update_job_status(&wedged.id, JobStatus::Running, StatusUpdate::default()).unwrap();

    fake.advance(Duration::from_secs(60 * 60 * 48));
    let fresh = store.create_job(JobType::Sync, JobParams::Empty, JsonMap::new()).unwrap();

    assert_eq!(store.stale_jobs().len(), 2);

    let cutoff = fake.utc_now() - chrono::Duration::hours(24);
    let failed = store.fail_stale_jobs(cutoff).unwrap();
    assert_eq!(failed, 1);

    let row = store.job(&wedged.id).unwrap();
    assert_eq!(row.status, JobStatus::Failed);
    assert_eq!(row.error.as_deref(), Some("Job stale after restart"));
    assert_eq!(store.job(&fresh.id).unwrap().status, JobStatus::Pending);
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let wal = dir.path().join("events.wal");
    let snapshot = dir.path().join("state.snapshot");
    let (_, clock) = fake_clock();

    let job_id = {
        let store = Store::open(&wal, &snapshot, Arc::clone(&clock)).unwrap();
        let job = store.create_job(JobType::Sync, JobParams::Empty, JsonMap::new()).unwrap();
        store
            .update_job_status(&job.id, JobStatus::Running, StatusUpdate::default().progress(30))
            .unwrap();
        store.flush().unwrap();
        job.id
    };

    let store = Store::open(&wal, &snapshot, clock).unwrap();
    let job = store.job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.progress, 30);
}

#[test]
fn checkpoint_truncates_wal_and_preserves_state() {
    let dir = tempfile::tempdir().unwrap();
    let wal = dir.path().join("events.wal");
    let snapshot = dir.path().join("state.snapshot");
    let (_, clock) = fake_clock();

    let (job_id, plan_id) = {
        let store = Store::open(&wal, &snapshot, Arc::clone(&clock)).unwrap();
        let job = store.create_job(JobType::Analysis, JobParams::Empty, JsonMap::new()).unwrap();
        let plan = store.create_plan("p", None, JsonMap::new(), Some(job.id)).unwrap();
        store.checkpoint().unwrap();
        // Post-checkpoint mutation lands in the truncated WAL tail.
        store
            .update_job_status(&job.id, JobStatus::Running, StatusUpdate::default())
            .unwrap();
        store.flush().unwrap();
        (job.id, plan.id)
    };

    let store = Store::open(&wal, &snapshot, clock).unwrap();
    assert_eq!(store.job(&job_id).unwrap().status, JobStatus::Running);
    assert!(store.plan(plan_id).is_some());
}

#[test]
fn plan_ids_are_monotonic() {
    let (store, _) = open_store();
    let first = store.create_plan("a", None, JsonMap::new(), None).unwrap();
    let second = store.create_plan("b", Some("desc"), JsonMap::new(), None).unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.status, PlanStatus::Pending);
}

#[test]
fn append_changes_assigns_sequential_ids() {
    let (store, _) = open_store();
    let plan = store.create_plan("p", None, JsonMap::new(), None).unwrap();
    let batch_one = store
        .append_changes(plan.id, vec![tag_add_change("s1", "a"), tag_add_change("s1", "b")])
        .unwrap();
    let batch_two = store.append_changes(plan.id, vec![tag_add_change("s2", "c")]).unwrap();

    assert_eq!(batch_one[0].id, 1);
    assert_eq!(batch_one[1].id, 2);
    assert_eq!(batch_two[0].id, 3);
    assert_eq!(batch_one[0].status, ChangeStatus::Pending);
}

#[test]
fn append_to_missing_plan_is_not_found() {
    let (store, _) = open_store();
    let err = store.append_changes(42, vec![tag_add_change("s", "t")]).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn ensure_daemon_is_idempotent_by_name() {
    let (store, _) = open_store();
    let first = store.ensure_daemon("auto_stash_sync", DaemonKind::AutoStashSync).unwrap();
    let second = store.ensure_daemon("auto_stash_sync", DaemonKind::AutoStashSync).unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(store.daemons().len(), 1);
}

#[test]
fn heartbeat_is_runtime_only() {
    let dir = tempfile::tempdir().unwrap();
    let wal = dir.path().join("events.wal");
    let snapshot = dir.path().join("state.snapshot");
    let (_, clock) = fake_clock();

    let daemon_id = {
        let store = Store::open(&wal, &snapshot, Arc::clone(&clock)).unwrap();
        let record = store.ensure_daemon("test", DaemonKind::Test).unwrap();
        store.touch_daemon_heartbeat(&record.id);
        assert!(store.daemon(&record.id).unwrap().last_heartbeat.is_some());
        store.flush().unwrap();
        record.id
    };

    let store = Store::open(&wal, &snapshot, clock).unwrap();
    assert!(store.daemon(&daemon_id).unwrap().last_heartbeat.is_none());
}

#[test]
fn sync_begin_finish_round_trip() {
    let (store, _) = open_store();
    let entry = store.begin_sync(SyncEntityType::Scene, None).unwrap();
    assert!(store.last_sync(SyncEntityType::Scene).is_none());

    let finished = store
        .finish_sync(
            entry.id,
            SyncRunStatus::Completed,
            SyncCounters { synced: 9, ..Default::default() },
            None,
        )
        .unwrap();
    assert_eq!(finished.counters.synced, 9);
    assert_eq!(store.last_sync(SyncEntityType::Scene), finished.completed_at);
}

#[test]
fn last_sync_is_stable_until_next_completion() {
    let (store, fake) = open_store();
    let entry = store.begin_sync(SyncEntityType::Scene, None).unwrap();
    store
        .finish_sync(entry.id, SyncRunStatus::Completed, SyncCounters::default(), None)
        .unwrap();
    let watermark = store.last_sync(SyncEntityType::Scene).unwrap();

    fake.advance(Duration::from_secs(600));
    let failed = store.begin_sync(SyncEntityType::Scene, None).unwrap();
    store
        .finish_sync(
            failed.id,
            SyncRunStatus::Failed,
            SyncCounters::default(),
            Some(serde_json::json!({"error": "boom"})),
        )
        .unwrap();
    assert_eq!(store.last_sync(SyncEntityType::Scene), Some(watermark));

    fake.advance(Duration::from_secs(600));
    let next = store.begin_sync(SyncEntityType::Scene, None).unwrap();
    store.finish_sync(next.id, SyncRunStatus::Completed, SyncCounters::default(), None).unwrap();
    assert!(store.last_sync(SyncEntityType::Scene).unwrap() > watermark);
}

proptest! {
    /// Once terminal, no sequence of further updates changes the status.
    #[test]
    fn terminal_status_is_monotonic(
        terminal_idx in 0usize..3,
        later in proptest::collection::vec(0usize..6, 0..12),
    ) {
        let statuses = [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelling,
            JobStatus::Cancelled,
        ];
        let terminals = [JobStatus::Completed, JobStatus::Failed, JobStatus::Cancelled];

        let (store, _) = open_store();
        let job = store.create_job(JobType::Test, JobParams::Empty, JsonMap::new()).unwrap();
        let terminal = terminals[terminal_idx];
        store.update_job_status(&job.id, terminal, StatusUpdate::default()).unwrap();

        for idx in later {
            store.update_job_status(&job.id, statuses[idx], StatusUpdate::default()).unwrap();
            prop_assert_eq!(store.job(&job.id).unwrap().status, terminal);
        }
    }

    /// Progress stays in [0, 100] for any update sequence.
    #[test]
    fn progress_is_bounded(updates in proptest::collection::vec(any::<u8>(), 1..20)) {
        let (store, _) = open_store();
        let job = store.create_job(JobType::Test, JobParams::Empty, JsonMap::new()).unwrap();
        store.update_job_status(&job.id, JobStatus::Running, StatusUpdate::default()).unwrap();

        for pct in updates {
            store
                .update_job_status(
                    &job.id,
                    JobStatus::Running,
                    StatusUpdate::default().progress(pct),
                )
                .unwrap();
            let progress = store.job(&job.id).unwrap().progress;
            prop_assert!(progress <= 100);
        }
    }
}
