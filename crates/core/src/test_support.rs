// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for tests in this crate and downstream crates.

use crate::plan::{ChangeAction, NewChange};
use crate::JsonMap;

/// Build a JSON object map from key/value pairs.
pub fn json_map(entries: &[(&str, serde_json::Value)]) -> JsonMap {
    entries.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
}

/// A tag-add change proposal for the given scene.
pub fn tag_add_change(scene_id: &str, tag_name: &str) -> NewChange {
    NewChange {
        scene_id: scene_id.to_string(),
        field: "tags".to_string(),
        action: ChangeAction::Add,
        current_value: None,
        proposed_value: serde_json::json!({ "name": tag_name }),
        confidence: Some(0.9),
    }
}

/// A scalar title change proposal for the given scene.
pub fn title_change(scene_id: &str, title: &str) -> NewChange {
    NewChange {
        scene_id: scene_id.to_string(),
        field: "title".to_string(),
        action: ChangeAction::Set,
        current_value: None,
        proposed_value: serde_json::json!(title),
        confidence: Some(0.8),
    }
}
