// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed job parameters.
//!
//! Per-type parameter shapes are declared in one place instead of an open
//! key/value bag; a handler receiving the wrong variant fails the job with a
//! validation error rather than misreading loose keys.

use serde::{Deserialize, Serialize};

/// Parameters captured at job creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum JobParams {
    /// Full or incremental library sync (SYNC).
    Sync {
        /// Force a full resync regardless of last-sync time.
        #[serde(default)]
        force: bool,
        /// Pending-scene count observed by the trigger, for reporting.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pending_scenes: Option<u64>,
    },

    /// Targeted scene sync (SYNC_SCENES).
    SceneSync {
        scene_ids: Vec<String>,
        #[serde(default)]
        force: bool,
    },

    /// Per-entity sync (SYNC_PERFORMERS / SYNC_TAGS / SYNC_STUDIOS).
    EntitySync {
        #[serde(default)]
        force: bool,
    },

    /// Scene analysis (ANALYSIS / NON_AI_ANALYSIS / GENERATE_DETAILS).
    Analysis {
        scene_ids: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plan_name: Option<String>,
    },

    /// Apply an analysis plan (APPLY_PLAN).
    ApplyPlan {
        plan_id: i64,
        /// Restrict to specific changes; `None` means all approved changes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        change_ids: Option<Vec<i64>>,
    },

    /// Upstream metadata scan (STASH_SCAN).
    Scan {
        #[serde(default = "default_scan_paths")]
        paths: Vec<String>,
        #[serde(default)]
        rescan: bool,
    },

    /// Upstream metadata generation (STASH_GENERATE).
    Generate {
        #[serde(default)]
        overwrite: bool,
    },

    /// Maintenance cleanup (CLEANUP).
    Cleanup {
        #[serde(default = "default_cleanup_days")]
        days: u32,
    },

    /// Test job (TEST).
    Test {
        #[serde(default = "default_test_steps")]
        steps: u32,
        #[serde(default = "default_test_delay_ms")]
        step_delay_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fail_at_step: Option<u32>,
    },

    /// No parameters.
    Empty,
}

fn default_scan_paths() -> Vec<String> {
    vec!["/data".to_string()]
}

fn default_cleanup_days() -> u32 {
    30
}

fn default_test_steps() -> u32 {
    5
}

fn default_test_delay_ms() -> u64 {
    1000
}

impl Default for JobParams {
    fn default() -> Self {
        JobParams::Empty
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
