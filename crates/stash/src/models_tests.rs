// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn upstream_timestamp_converts_to_pacific_and_drops_micros() {
    let tz: chrono_tz::Tz = DEFAULT_UPSTREAM_TIMEZONE.parse().unwrap();
    // 2025-01-01T00:00:00.654321Z is 2024-12-31T16:00:00 in Los Angeles (PST).
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        + chrono::Duration::microseconds(654_321);
    assert_eq!(upstream_timestamp(at, tz), "2024-12-31T16:00:00Z");
}

#[test]
fn upstream_timestamp_honors_dst() {
    let tz: chrono_tz::Tz = DEFAULT_UPSTREAM_TIMEZONE.parse().unwrap();
    // July is PDT (UTC-7).
    let at = Utc.with_ymd_and_hms(2025, 7, 1, 12, 30, 45).unwrap();
    assert_eq!(upstream_timestamp(at, tz), "2025-07-01T05:30:45Z");
}

#[test]
fn scene_patch_empty_detection() {
    let mut patch = ScenePatch::new("scene-1");
    assert!(patch.is_empty());
    patch.title = Some("new title".into());
    assert!(!patch.is_empty());
}

#[test]
fn scene_patch_serializes_only_set_fields() {
    let patch = ScenePatch {
        id: "scene-1".into(),
        rating100: Some(80),
        ..Default::default()
    };
    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(json["id"], "scene-1");
    assert_eq!(json["rating100"], 80);
    assert!(json.get("title").is_none());
    assert!(json.get("tag_ids").is_none());
}

#[test]
fn scan_input_uses_camel_case() {
    let input = ScanInput::new(vec!["/data".into()], false);
    let json = serde_json::to_value(&input).unwrap();
    assert_eq!(json["scanGenerateCovers"], true);
    assert_eq!(json["rescan"], false);
}

#[test]
fn stash_job_parses_upstream_shape() {
    let json = serde_json::json!({
        "id": "42",
        "status": "RUNNING",
        "progress": 0.35,
        "description": "Scanning /data",
        "startTime": "2025-01-01T00:00:00Z",
        "endTime": null,
        "error": null,
    });
    let job: StashJob = serde_json::from_value(json).unwrap();
    assert_eq!(job.status, StashJobStatus::Running);
    assert_eq!(job.progress, Some(0.35));
    assert_eq!(job.start_time.as_deref(), Some("2025-01-01T00:00:00Z"));
}

#[test]
fn scene_tolerates_missing_optional_fields() {
    let scene: Scene = serde_json::from_value(serde_json::json!({"id": "1"})).unwrap();
    assert_eq!(scene.id, "1");
    assert!(scene.tags.is_empty());
    assert!(!scene.organized);
}

#[test]
fn criterion_filter_shape() {
    let filter = SceneFilter {
        updated_at: Some(TimestampCriterion::greater_than("2025-01-01T00:00:00Z")),
    };
    let json = serde_json::to_value(&filter).unwrap();
    assert_eq!(json["updated_at"]["modifier"], "GREATER_THAN");
    assert_eq!(json["updated_at"]["value"], "2025-01-01T00:00:00Z");
}
