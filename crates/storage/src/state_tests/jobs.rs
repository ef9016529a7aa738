// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn created_job_is_queryable() {
    let (state, id) = state_with_job(JobType::Sync);
    assert_eq!(state.job(&id).map(|j| j.status), Some(JobStatus::Pending));
}

#[test]
fn duplicate_created_event_does_not_reset_row() {
    let (mut state, id) = state_with_job(JobType::Sync);
    state.apply_event(&status_event(id, JobStatus::Running));

    // Re-applying the creation event must not clobber the running row.
    let stale_copy = fresh_job(JobType::Sync);
    let mut duplicate = stale_copy;
    duplicate.id = id;
    state.apply_event(&Event::JobCreated { job: duplicate });
    assert_eq!(state.job(&id).map(|j| j.status), Some(JobStatus::Running));
}

#[test]
fn status_event_merges_fields() {
    let (mut state, id) = state_with_job(JobType::Analysis);
    let now = Utc::now();
    state.apply_event(&Event::JobStatusChanged {
        id,
        status: JobStatus::Running,
        progress: Some(40),
        processed_items: Some(4),
        total_items: Some(10),
        result: None,
        error: None,
        message: Some("4 of 10".into()),
        started_at: Some(now),
        completed_at: None,
    });

    let job = state.job(&id).unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.progress, 40);
    assert_eq!(job.processed_items, Some(4));
    assert_eq!(job.last_message(), Some("4 of 10"));
    assert_eq!(job.started_at, Some(now));
}

#[test]
fn absent_fields_leave_row_untouched() {
    let (mut state, id) = state_with_job(JobType::Analysis);
    let now = Utc::now();
    state.apply_event(&Event::JobStatusChanged {
        id,
        status: JobStatus::Running,
        progress: Some(60),
        processed_items: None,
        total_items: None,
        result: None,
        error: None,
        message: Some("over half".into()),
        started_at: Some(now),
        completed_at: None,
    });
    state.apply_event(&status_event(id, JobStatus::Cancelling));

    let job = state.job(&id).unwrap();
    assert_eq!(job.status, JobStatus::Cancelling);
    assert_eq!(job.progress, 60);
    assert_eq!(job.last_message(), Some("over half"));
    assert_eq!(job.started_at, Some(now));
}

#[test]
fn meta_set_adds_entry() {
    let (mut state, id) = state_with_job(JobType::Test);
    state.apply_event(&Event::JobMetaSet { id, key: "task_id".into(), value: "t-1".into() });
    assert_eq!(state.job(&id).unwrap().task_id(), Some("t-1"));
}

#[test]
fn pruned_jobs_are_removed() {
    let (mut state, id) = state_with_job(JobType::Cleanup);
    state.apply_event(&Event::JobsPruned { ids: vec![id] });
    assert!(state.job(&id).is_none());
}

#[test]
fn jobs_sorted_newest_first_with_filters() {
    let mut state = MaterializedState::default();
    let mut ids = Vec::new();
    for offset in 0..3 {
        let mut job = fresh_job(JobType::Sync);
        job.created_at = Utc::now() + Duration::seconds(offset);
        ids.push(job.id);
        state.apply_event(&Event::JobCreated { job });
    }
    state.apply_event(&status_event(ids[0], JobStatus::Running));

    let all = state.jobs_sorted(None, None);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, ids[2]);

    let running = state.jobs_sorted(Some(JobStatus::Running), None);
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, ids[0]);

    assert!(state.jobs_sorted(None, Some(JobType::Analysis)).is_empty());
}

#[test]
fn active_jobs_excludes_terminal() {
    let mut state = MaterializedState::default();
    let ids: Vec<JobId> = (0..4)
        .map(|_| {
            let job = fresh_job(JobType::Analysis);
            let id = job.id;
            state.apply_event(&Event::JobCreated { job });
            id
        })
        .collect();
    state.apply_event(&status_event(ids[0], JobStatus::Running));
    state.apply_event(&status_event(ids[1], JobStatus::Cancelling));
    state.apply_event(&status_event(ids[2], JobStatus::Completed));

    let active: Vec<JobId> = state.active_jobs(None).iter().map(|j| j.id).collect();
    assert_eq!(active.len(), 3);
    assert!(!active.contains(&ids[2]));
}
