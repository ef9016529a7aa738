// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use stashhog_core::{DaemonJobAction, DaemonJobHistory, DaemonRunStatus, ErrorType};

fn registered(state: &mut MaterializedState) -> DaemonRecord {
    let record = DaemonRecord::new("auto_stash_sync", DaemonKind::AutoStashSync, Utc::now());
    state.apply_event(&Event::DaemonRegistered { daemon: record.clone() });
    record
}

#[test]
fn register_and_lookup_by_name() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);
    assert_eq!(state.daemon_by_name("auto_stash_sync").map(|d| d.id), Some(record.id));
}

#[test]
fn status_change_sets_and_clears_started_at() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);
    let started = Utc::now();

    state.apply_event(&Event::DaemonStatusChanged {
        id: record.id,
        status: DaemonRunStatus::Running,
        started_at: Some(started),
        updated_at: started,
    });
    assert_eq!(state.daemon(&record.id).unwrap().started_at, Some(started));

    state.apply_event(&Event::DaemonStatusChanged {
        id: record.id,
        status: DaemonRunStatus::Stopped,
        started_at: None,
        updated_at: Utc::now(),
    });
    let row = state.daemon(&record.id).unwrap();
    assert_eq!(row.status, DaemonRunStatus::Stopped);
    assert!(row.started_at.is_none());
}

#[test]
fn config_update_merges_only_provided_fields() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);

    let mut cfg = JsonMap::new();
    cfg.insert("job_interval_seconds".into(), 60.into());
    state.apply_event(&Event::DaemonConfigUpdated {
        id: record.id,
        configuration: Some(cfg),
        enabled: None,
        auto_start: Some(true),
        updated_at: Utc::now(),
    });

    let row = state.daemon(&record.id).unwrap();
    assert_eq!(row.config_u64("job_interval_seconds", 300), 60);
    assert!(row.enabled);
    assert!(row.auto_start);
}

#[test]
fn same_error_within_window_coalesces() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);
    let at = Utc::now();

    for offset in 0..3 {
        state.apply_event(&Event::DaemonErrorRecorded {
            daemon_id: record.id,
            error_type: ErrorType::Connection,
            message: "upstream unreachable".into(),
            details: None,
            context: JsonMap::new(),
            at: at + Duration::minutes(offset),
        });
    }

    let errors: Vec<_> =
        state.daemon_errors.iter().filter(|e| e.daemon_id == record.id).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].occurrence_count, 3);
    assert_eq!(errors[0].first_seen, at);
    assert_eq!(errors[0].last_seen, at + Duration::minutes(2));
}

#[test]
fn old_error_outside_window_gets_new_row() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);
    let at = Utc::now();

    state.apply_event(&Event::DaemonErrorRecorded {
        daemon_id: record.id,
        error_type: ErrorType::Connection,
        message: "upstream unreachable".into(),
        details: None,
        context: JsonMap::new(),
        at,
    });
    state.apply_event(&Event::DaemonErrorRecorded {
        daemon_id: record.id,
        error_type: ErrorType::Connection,
        message: "upstream unreachable".into(),
        details: None,
        context: JsonMap::new(),
        at: at + Duration::hours(25),
    });

    let errors: Vec<_> =
        state.daemon_errors.iter().filter(|e| e.daemon_id == record.id).collect();
    assert_eq!(errors.len(), 2);
}

#[test]
fn different_message_is_not_coalesced() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);
    let at = Utc::now();

    for message in ["timeout", "refused"] {
        state.apply_event(&Event::DaemonErrorRecorded {
            daemon_id: record.id,
            error_type: ErrorType::Connection,
            message: message.into(),
            details: None,
            context: JsonMap::new(),
            at,
        });
    }
    assert_eq!(state.daemon_errors.len(), 2);
}

#[test]
fn error_updates_status_row_counters() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);
    let at = Utc::now();

    for offset in 0..2 {
        state.apply_event(&Event::DaemonErrorRecorded {
            daemon_id: record.id,
            error_type: ErrorType::Processing,
            message: "bad batch".into(),
            details: None,
            context: JsonMap::new(),
            at: at + Duration::minutes(offset),
        });
    }

    let row = state.daemon_status.get(&record.id).unwrap();
    assert_eq!(row.error_count_24h, 2);
    assert_eq!(row.last_error_message.as_deref(), Some("bad batch"));
}

#[test]
fn launched_jobs_update_24h_counter() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);
    let at = Utc::now();

    for offset in 0..3 {
        state.apply_event(&Event::DaemonJobTracked {
            entry: DaemonJobHistory {
                daemon_id: record.id,
                job_id: stashhog_core::JobId::new(),
                action: DaemonJobAction::Launched,
                reason: None,
                created_at: at + Duration::minutes(offset),
            },
        });
    }

    assert_eq!(state.daemon_status.get(&record.id).unwrap().jobs_launched_24h, 3);
}

#[test]
fn progress_update_is_in_place() {
    let mut state = MaterializedState::default();
    let record = registered(&mut state);
    let at = Utc::now();

    state.apply_event(&Event::DaemonProgressUpdated {
        daemon_id: record.id,
        current_activity: Some("checking pending scenes".into()),
        progress: Some(50.0),
        items_processed: Some(10),
        items_pending: Some(10),
        at,
    });
    state.apply_event(&Event::DaemonProgressUpdated {
        daemon_id: record.id,
        current_activity: None,
        progress: Some(100.0),
        items_processed: Some(20),
        items_pending: Some(0),
        at: at + Duration::seconds(5),
    });

    assert_eq!(state.daemon_status.len(), 1);
    let row = state.daemon_status.get(&record.id).unwrap();
    assert_eq!(row.current_activity.as_deref(), Some("checking pending scenes"));
    assert_eq!(row.current_progress, Some(100.0));
    assert_eq!(row.items_processed, 20);
}
