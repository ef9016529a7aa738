// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use stashhog_core::{SyncCounters, SyncEntityType, SyncHistory, SyncRunStatus};

fn started(state: &mut MaterializedState, entity: SyncEntityType) -> SyncHistory {
    let entry = SyncHistory::begin(entity, None, Utc::now());
    state.apply_event(&Event::SyncStarted { entry: entry.clone() });
    entry
}

#[test]
fn finish_stamps_status_and_counters() {
    let mut state = MaterializedState::default();
    let entry = started(&mut state, SyncEntityType::Scene);
    let done = Utc::now();

    state.apply_event(&Event::SyncFinished {
        id: entry.id,
        status: SyncRunStatus::Completed,
        completed_at: done,
        counters: SyncCounters { synced: 12, ..Default::default() },
        error_details: None,
    });

    let row = &state.sync_history[0];
    assert_eq!(row.status, SyncRunStatus::Completed);
    assert_eq!(row.completed_at, Some(done));
    assert_eq!(row.counters.synced, 12);
}

#[test]
fn last_sync_is_max_completed_of_matching_entity() {
    let mut state = MaterializedState::default();

    let early = started(&mut state, SyncEntityType::Scene);
    let late = started(&mut state, SyncEntityType::Scene);
    let failed = started(&mut state, SyncEntityType::Scene);
    let other = started(&mut state, SyncEntityType::Tag);

    let t0 = Utc::now();
    for (entry, status, at) in [
        (&early, SyncRunStatus::Completed, t0),
        (&late, SyncRunStatus::Completed, t0 + Duration::hours(1)),
        (&failed, SyncRunStatus::Failed, t0 + Duration::hours(2)),
        (&other, SyncRunStatus::Completed, t0 + Duration::hours(3)),
    ] {
        state.apply_event(&Event::SyncFinished {
            id: entry.id,
            status,
            completed_at: at,
            counters: SyncCounters::default(),
            error_details: None,
        });
    }

    // Failed runs and other entity types do not move the scene watermark.
    assert_eq!(state.last_sync(SyncEntityType::Scene), Some(t0 + Duration::hours(1)));
    assert_eq!(state.last_sync(SyncEntityType::Tag), Some(t0 + Duration::hours(3)));
    assert_eq!(state.last_sync(SyncEntityType::Performer), None);
}

#[test]
fn history_is_sorted_newest_first() {
    let mut state = MaterializedState::default();
    let first = started(&mut state, SyncEntityType::Scene);
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = started(&mut state, SyncEntityType::Scene);

    let rows = state.sync_history_sorted(Some(SyncEntityType::Scene));
    assert_eq!(rows[0].id, second.id);
    assert_eq!(rows[1].id, first.id);
}
