// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use stashhog_core::FakeClock;
use stashhog_stash::{FakeStash, DEFAULT_UPSTREAM_TIMEZONE};

fn coordinator() -> (SyncCoordinator, Store, Arc<FakeStash>, Arc<FakeClock>) {
    let clock = Arc::new(FakeClock::new());
    let store = Store::ephemeral(clock.clone()).unwrap();
    let fake = Arc::new(FakeStash::new());
    let tz: chrono_tz::Tz = DEFAULT_UPSTREAM_TIMEZONE.parse().unwrap();
    (SyncCoordinator::new(store.clone(), fake.clone(), tz), store, fake, clock)
}

#[tokio::test]
async fn no_prior_sync_counts_all_scenes() {
    let (coordinator, _, fake, _) = coordinator();
    fake.seed_scene("1", "one");
    fake.seed_scene("2", "two");

    assert!(coordinator.incremental_scene_filter().is_none());
    assert_eq!(coordinator.pending_scene_count().await.unwrap(), 2);
}

#[tokio::test]
async fn incremental_filter_formats_watermark_in_upstream_timezone() {
    let (coordinator, store, _, clock) = coordinator();
    clock.set_utc(chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    let entry = store.begin_sync(SyncEntityType::Scene, None).unwrap();
    store
        .finish_sync(entry.id, SyncRunStatus::Completed, SyncCounters::default(), None)
        .unwrap();

    let filter = coordinator.incremental_scene_filter().unwrap();
    let criterion = filter.updated_at.unwrap();
    assert_eq!(criterion.modifier, "GREATER_THAN");
    // 2025-01-01T00:00:00Z is 16:00 the previous day in Los Angeles.
    assert_eq!(criterion.value, "2024-12-31T16:00:00Z");
}

#[tokio::test]
async fn pending_count_uses_scripted_upstream_answer() {
    let (coordinator, store, fake, _) = coordinator();
    let entry = store.begin_sync(SyncEntityType::Scene, None).unwrap();
    store
        .finish_sync(entry.id, SyncRunStatus::Completed, SyncCounters::default(), None)
        .unwrap();
    fake.set_pending_count(5);

    assert_eq!(coordinator.pending_scene_count().await.unwrap(), 5);
}

#[tokio::test]
async fn status_reports_all_entities() {
    let (coordinator, store, fake, _) = coordinator();
    fake.seed_scene("1", "one");
    let entry = store.begin_sync(SyncEntityType::Tag, None).unwrap();
    store
        .finish_sync(entry.id, SyncRunStatus::Completed, SyncCounters::default(), None)
        .unwrap();

    let status = coordinator.status().await.unwrap();
    assert!(status.last_tag_sync.is_some());
    assert!(status.last_scene_sync.is_none());
    assert_eq!(status.pending_scenes, 1);
}

#[tokio::test]
async fn begin_and_finish_record_history() {
    let (coordinator, _, _, _) = coordinator();
    let entry = coordinator.begin_sync(SyncEntityType::Scene, None).unwrap();
    assert_eq!(entry.status, SyncRunStatus::InProgress);

    let finished = coordinator
        .finish_sync(
            entry.id,
            SyncRunStatus::Completed,
            SyncCounters { synced: 4, ..Default::default() },
            None,
        )
        .unwrap();
    assert_eq!(finished.counters.synced, 4);
    assert_eq!(coordinator.last_sync(SyncEntityType::Scene), finished.completed_at);
}
