// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_record_defaults() {
    let now = chrono::Utc::now();
    let d = DaemonRecord::new("auto_stash_sync", DaemonKind::AutoStashSync, now);
    assert_eq!(d.status, DaemonRunStatus::Stopped);
    assert!(d.enabled);
    assert!(!d.auto_start);
    assert!(d.started_at.is_none());
    assert!(d.last_heartbeat.is_none());
}

#[test]
fn config_u64_falls_back_to_default() {
    let now = chrono::Utc::now();
    let mut d = DaemonRecord::new("t", DaemonKind::Test, now);
    assert_eq!(d.config_u64("job_interval_seconds", 300), 300);
    d.configuration.insert("job_interval_seconds".into(), 60.into());
    assert_eq!(d.config_u64("job_interval_seconds", 300), 60);
    d.configuration.insert("bogus".into(), "text".into());
    assert_eq!(d.config_u64("bogus", 7), 7);
}

#[test]
fn log_level_wire_format_is_uppercase() {
    assert_eq!(serde_json::to_string(&LogLevel::Warning).unwrap(), "\"WARNING\"");
    assert_eq!(LogLevel::Error.to_string(), "ERROR");
}

#[test]
fn log_levels_are_ordered() {
    assert!(LogLevel::Debug < LogLevel::Info);
    assert!(LogLevel::Warning < LogLevel::Error);
}

#[test]
fn job_action_wire_format() {
    assert_eq!(serde_json::to_string(&DaemonJobAction::Launched).unwrap(), "\"LAUNCHED\"");
}
