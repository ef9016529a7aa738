// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use stashhog_core::JobId;
use std::io::Write as _;

fn event(n: usize) -> Event {
    Event::DaemonLogAppended {
        log: stashhog_core::DaemonLog {
            daemon_id: stashhog_core::DaemonId::new(),
            level: stashhog_core::LogLevel::Info,
            message: format!("entry {n}"),
            created_at: chrono::Utc::now(),
        },
    }
}

#[test]
fn append_assigns_increasing_seqs() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&dir.path().join("events.wal")).unwrap();
    let s1 = wal.append(&event(1)).unwrap();
    let s2 = wal.append(&event(2)).unwrap();
    assert_eq!(s2, s1 + 1);
    assert_eq!(wal.last_seq(), s2);
}

#[test]
fn replay_returns_entries_after_seq() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.wal");
    let mut wal = Wal::open(&path).unwrap();
    for n in 0..5 {
        wal.append(&event(n)).unwrap();
    }
    wal.flush().unwrap();

    let all = wal.replay_after(0).unwrap();
    assert_eq!(all.len(), 5);
    let tail = wal.replay_after(3).unwrap();
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].seq, 4);
}

#[test]
fn reopen_continues_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.wal");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&event(1)).unwrap();
        wal.append(&event(2)).unwrap();
        wal.flush().unwrap();
    }
    let mut wal = Wal::open(&path).unwrap();
    assert_eq!(wal.last_seq(), 2);
    let seq = wal.append(&event(3)).unwrap();
    assert_eq!(seq, 3);
}

#[test]
fn unflushed_entries_are_not_durable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.wal");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&event(1)).unwrap();
        // Dropped without flush.
    }
    let mut wal = Wal::open(&path).unwrap();
    assert_eq!(wal.replay_after(0).unwrap().len(), 0);
}

#[test]
fn corrupt_tail_is_rotated_keeping_valid_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.wal");
    {
        let mut wal = Wal::open(&path).unwrap();
        wal.append(&event(1)).unwrap();
        wal.append(&event(2)).unwrap();
        wal.flush().unwrap();
    }
    {
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"seq\": 3, \"event\": {\"type\": \"job:cre").unwrap();
    }

    let mut wal = Wal::open(&path).unwrap();
    assert_eq!(wal.last_seq(), 2);
    assert_eq!(wal.replay_after(0).unwrap().len(), 2);
    assert!(path.with_extension("wal.bak").exists());
}

#[test]
fn truncate_through_drops_old_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.wal");
    let mut wal = Wal::open(&path).unwrap();
    for n in 0..4 {
        wal.append(&event(n)).unwrap();
    }
    wal.truncate_through(2).unwrap();

    let entries = wal.replay_after(0).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 3);

    // New appends continue past the retained tail.
    let seq = wal.append(&event(9)).unwrap();
    assert_eq!(seq, 5);
    wal.flush().unwrap();
    assert_eq!(wal.replay_after(2).unwrap().len(), 3);
}

#[test]
fn needs_flush_after_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&dir.path().join("events.wal")).unwrap();
    assert!(!wal.needs_flush());
    for n in 0..FLUSH_THRESHOLD {
        wal.append(&event(n)).unwrap();
    }
    assert!(wal.needs_flush());
    wal.flush().unwrap();
    assert!(!wal.needs_flush());
}

#[test]
fn jobs_pruned_event_round_trips_through_wal() {
    let dir = tempfile::tempdir().unwrap();
    let mut wal = Wal::open(&dir.path().join("events.wal")).unwrap();
    let ids = vec![JobId::new(), JobId::new()];
    wal.append(&Event::JobsPruned { ids: ids.clone() }).unwrap();
    wal.flush().unwrap();

    let entries = wal.replay_after(0).unwrap();
    match &entries[0].event {
        Event::JobsPruned { ids: got } => assert_eq!(got, &ids),
        other => panic!("unexpected event: {other:?}"),
    }
}
