// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translate a reviewed change into an upstream scene mutation.
//!
//! Proposed values arrive as analysis JSON: a plain string, an object with a
//! `name` (and optional `id`), or a list of either. List fields (tags,
//! performers) are resolved against the upstream catalog and merged with the
//! scene's current entries; scalar fields become direct patch assignments.

use crate::error::JobError;
use serde_json::Value;
use stashhog_core::{ChangeAction, PlanChange};
use stashhog_stash::{Scene, ScenePatch, StashApi};

/// Build the `sceneUpdate` patch for one change against the current scene.
pub async fn build_patch(
    api: &dyn StashApi,
    scene: &Scene,
    change: &PlanChange,
) -> Result<ScenePatch, JobError> {
    let mut patch = ScenePatch::new(&scene.id);

    match change.field.as_str() {
        "tags" => {
            let mut tag_ids: Vec<String> = scene.tags.iter().map(|t| t.id.clone()).collect();
            match change.action {
                ChangeAction::Add => {
                    for name in value_names(&change.proposed_value)? {
                        let tag = api.find_or_create_tag(&name).await?;
                        if !tag_ids.contains(&tag.id) {
                            tag_ids.push(tag.id);
                        }
                    }
                }
                ChangeAction::Remove => {
                    let removed = value_names(&change.proposed_value)?;
                    let keep: Vec<String> = scene
                        .tags
                        .iter()
                        .filter(|t| !removed.iter().any(|r| r.eq_ignore_ascii_case(&t.name)))
                        .map(|t| t.id.clone())
                        .collect();
                    tag_ids = keep;
                }
                ChangeAction::Set | ChangeAction::Update => {
                    let mut ids = Vec::new();
                    for name in value_names(&change.proposed_value)? {
                        let tag = api.find_or_create_tag(&name).await?;
                        if !ids.contains(&tag.id) {
                            ids.push(tag.id);
                        }
                    }
                    tag_ids = ids;
                }
            }
            patch.tag_ids = Some(tag_ids);
        }

        "performers" => {
            let mut performer_ids: Vec<String> =
                scene.performers.iter().map(|p| p.id.clone()).collect();
            match change.action {
                ChangeAction::Add => {
                    for name in value_names(&change.proposed_value)? {
                        let id = resolve_performer(api, &name).await?;
                        if !performer_ids.contains(&id) {
                            performer_ids.push(id);
                        }
                    }
                }
                ChangeAction::Remove => {
                    let removed = value_names(&change.proposed_value)?;
                    performer_ids = scene
                        .performers
                        .iter()
                        .filter(|p| !removed.iter().any(|r| r.eq_ignore_ascii_case(&p.name)))
                        .map(|p| p.id.clone())
                        .collect();
                }
                ChangeAction::Set | ChangeAction::Update => {
                    let mut ids = Vec::new();
                    for name in value_names(&change.proposed_value)? {
                        let id = resolve_performer(api, &name).await?;
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                    performer_ids = ids;
                }
            }
            patch.performer_ids = Some(performer_ids);
        }

        "studio" => {
            let name = single_name(&change.proposed_value)?;
            let studios = api.find_studios(Some(&name)).await?;
            let studio = studios
                .into_iter()
                .find(|s| s.name.eq_ignore_ascii_case(&name))
                .ok_or_else(|| JobError::Validation(format!("studio not found: {name}")))?;
            patch.studio_id = Some(studio.id);
        }

        "title" => patch.title = Some(scalar_string(&change.proposed_value)?),
        "details" => patch.details = Some(scalar_string(&change.proposed_value)?),
        "date" => patch.date = Some(scalar_string(&change.proposed_value)?),
        "rating" | "rating100" => {
            let rating = change
                .proposed_value
                .as_i64()
                .ok_or_else(|| bad_value("numeric rating", &change.proposed_value))?;
            patch.rating100 = Some(rating as i32);
        }

        other => {
            return Err(JobError::Validation(format!("unsupported change field: {other}")));
        }
    }

    Ok(patch)
}

async fn resolve_performer(api: &dyn StashApi, name: &str) -> Result<String, JobError> {
    let matches = api.find_performers(Some(name)).await?;
    matches
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .map(|p| p.id)
        .ok_or_else(|| JobError::Validation(format!("performer not found: {name}")))
}

/// Names carried by a proposed value: a string, `{name}`, or a list of either.
fn value_names(value: &Value) -> Result<Vec<String>, JobError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Object(map) => match map.get("name").and_then(Value::as_str) {
            Some(name) => Ok(vec![name.to_string()]),
            None => Err(bad_value("object with name", value)),
        },
        Value::Array(items) => {
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                names.extend(value_names(item)?);
            }
            Ok(names)
        }
        _ => Err(bad_value("name value", value)),
    }
}

fn single_name(value: &Value) -> Result<String, JobError> {
    let names = value_names(value)?;
    match names.as_slice() {
        [only] => Ok(only.clone()),
        _ => Err(bad_value("single name", value)),
    }
}

fn scalar_string(value: &Value) -> Result<String, JobError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| bad_value("string", value))
}

fn bad_value(expected: &str, value: &Value) -> JobError {
    JobError::Validation(format!("expected {expected}, got {value}"))
}

#[cfg(test)]
#[path = "translate_tests.rs"]
mod tests;
