// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sync_params_round_trip() {
    let params = JobParams::Sync { force: false, pending_scenes: Some(5) };
    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(json["shape"], "sync");
    assert_eq!(json["pending_scenes"], 5);
    let back: JobParams = serde_json::from_value(json).unwrap();
    assert_eq!(back, params);
}

#[test]
fn defaults_fill_missing_fields() {
    let params: JobParams = serde_json::from_value(serde_json::json!({"shape": "scan"})).unwrap();
    match params {
        JobParams::Scan { paths, rescan } => {
            assert_eq!(paths, vec!["/data".to_string()]);
            assert!(!rescan);
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn apply_plan_omits_absent_change_ids() {
    let params = JobParams::ApplyPlan { plan_id: 7, change_ids: None };
    let json = serde_json::to_value(&params).unwrap();
    assert!(json.get("change_ids").is_none());
}

#[test]
fn empty_is_the_default() {
    assert_eq!(JobParams::default(), JobParams::Empty);
}

#[test]
fn unknown_shape_is_rejected() {
    let result: Result<JobParams, _> =
        serde_json::from_value(serde_json::json!({"shape": "mystery"}));
    assert!(result.is_err());
}
