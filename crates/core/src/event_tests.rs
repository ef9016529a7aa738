// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job::{Job, JobStatus};
use crate::job_type::JobType;
use crate::params::JobParams;
use crate::sync::SyncEntityType;

#[test]
fn job_created_round_trips() {
    let job = Job::new(
        JobId::new(),
        JobType::Analysis,
        JobParams::Empty,
        JsonMap::new(),
        Utc::now(),
    );
    let event = Event::JobCreated { job: job.clone() };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"job:created\""));
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn status_event_omits_absent_fields() {
    let event = Event::JobStatusChanged {
        id: JobId::new(),
        status: JobStatus::Running,
        progress: None,
        processed_items: None,
        total_items: None,
        result: None,
        error: None,
        message: None,
        started_at: Some(Utc::now()),
        completed_at: None,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert!(json.get("error").is_none());
    assert!(json.get("completed_at").is_none());
    assert!(json.get("started_at").is_some());
}

#[test]
fn sync_events_round_trip() {
    let entry = SyncHistory::begin(SyncEntityType::Scene, Some(JobId::new()), Utc::now());
    let started = Event::SyncStarted { entry: entry.clone() };
    let json = serde_json::to_string(&started).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, started);

    let finished = Event::SyncFinished {
        id: entry.id,
        status: SyncRunStatus::Completed,
        completed_at: Utc::now(),
        counters: SyncCounters { synced: 5, ..Default::default() },
        error_details: None,
    };
    let json = serde_json::to_string(&finished).unwrap();
    assert!(json.contains("\"type\":\"sync:finished\""));
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, finished);
}

#[test]
fn event_name_matches_serde_tag() {
    let event = Event::JobsPruned { ids: vec![] };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], event.name());
}
