// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shapes for the upstream GraphQL contract.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Timezone the upstream interprets timestamp filters in.
pub const DEFAULT_UPSTREAM_TIMEZONE: &str = "America/Los_Angeles";

/// Format a UTC timestamp for an upstream filter: second precision,
/// converted to the upstream's local timezone. Microseconds are dropped.
pub fn upstream_timestamp(at: DateTime<Utc>, tz: chrono_tz::Tz) -> String {
    let truncated = at.with_nanosecond(0).unwrap_or(at);
    truncated.with_timezone(&tz).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// An id/name pair (performer, tag, studio).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// One file backing a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(default)]
    pub bit_rate: Option<u64>,
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub audio_codec: Option<String>,
}

/// Scene object as returned by `findScenes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub organized: bool,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rating100: Option<i32>,
    #[serde(default)]
    pub files: Vec<SceneFile>,
    #[serde(default)]
    pub performers: Vec<NamedRef>,
    #[serde(default)]
    pub tags: Vec<NamedRef>,
    #[serde(default)]
    pub studio: Option<NamedRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of scenes plus the total match count.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenePage {
    pub count: u64,
    pub scenes: Vec<Scene>,
}

/// Pagination input (`FindFilterType`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindFilter {
    pub page: u32,
    pub per_page: u32,
}

impl Default for FindFilter {
    fn default() -> Self {
        Self { page: 1, per_page: 100 }
    }
}

/// Timestamp comparison criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampCriterion {
    pub value: String,
    pub modifier: String,
}

impl TimestampCriterion {
    pub fn greater_than(value: impl Into<String>) -> Self {
        Self { value: value.into(), modifier: "GREATER_THAN".to_string() }
    }
}

/// Scene filter (`SceneFilterType`), currently the incremental-sync subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<TimestampCriterion>,
}

/// Patch for `sceneUpdate`; absent fields are left untouched upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenePatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating100: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer_ids: Option<Vec<String>>,
}

impl ScenePatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// Whether the patch carries any field besides the id.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.details.is_none()
            && self.date.is_none()
            && self.rating100.is_none()
            && self.studio_id.is_none()
            && self.tag_ids.is_none()
            && self.performer_ids.is_none()
    }
}

/// Input for `metadataScan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanInput {
    pub paths: Vec<String>,
    pub rescan: bool,
    pub scan_generate_covers: bool,
    pub scan_generate_previews: bool,
    pub scan_generate_sprites: bool,
    pub scan_generate_phashes: bool,
}

impl ScanInput {
    pub fn new(paths: Vec<String>, rescan: bool) -> Self {
        Self {
            paths,
            rescan,
            scan_generate_covers: true,
            scan_generate_previews: true,
            scan_generate_sprites: true,
            scan_generate_phashes: true,
        }
    }
}

/// Input for `metadataGenerate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInput {
    pub covers: bool,
    pub sprites: bool,
    pub previews: bool,
    pub markers: bool,
    pub phashes: bool,
    pub overwrite: bool,
}

impl GenerateInput {
    pub fn new(overwrite: bool) -> Self {
        Self { covers: true, sprites: true, previews: true, markers: true, phashes: true, overwrite }
    }
}

/// Upstream job status (`JobStatus` in the Stash schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StashJobStatus {
    Ready,
    Running,
    Finished,
    Failed,
    Cancelled,
    Stopping,
}

/// Upstream job as returned by `findJob`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StashJob {
    pub id: String,
    pub status: StashJobStatus,
    /// Fraction in [0, 1].
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(default, rename = "endTime")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Upstream version info, used for connection tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashVersion {
    pub version: String,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub build_time: Option<String>,
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
