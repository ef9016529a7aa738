// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use stashhog_core::{Event, Job, JobId, JobParams, JobType, JsonMap};

fn state_with_job() -> (MaterializedState, JobId) {
    let mut state = MaterializedState::default();
    let job = Job::new(
        JobId::new(),
        JobType::Cleanup,
        JobParams::Empty,
        JsonMap::new(),
        chrono::Utc::now(),
    );
    let id = job.id;
    state.apply_event(&Event::JobCreated { job });
    (state, id)
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.snapshot");
    let (state, job_id) = state_with_job();

    let bytes = Snapshot::save(&path, 7, &state).unwrap();
    assert!(bytes > 0);

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 7);
    assert!(loaded.state.job(&job_id).is_some());
}

#[test]
fn load_missing_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = Snapshot::load(&dir.path().join("absent.snapshot")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn corrupt_snapshot_is_rotated_aside() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.snapshot");
    std::fs::write(&path, b"definitely not zstd").unwrap();

    let loaded = Snapshot::load(&path).unwrap();
    assert!(loaded.is_none());
    assert!(path.with_extension("snapshot.bak").exists());
    assert!(!path.exists());
}

#[test]
fn save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.snapshot");
    let (state, _) = state_with_job();

    Snapshot::save(&path, 1, &state).unwrap();
    Snapshot::save(&path, 2, &state).unwrap();
    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 2);
}
