// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reqwest-backed GraphQL transport with retry and backoff.

use crate::api::StashApi;
use crate::error::StashError;
use crate::models::{
    FindFilter, GenerateInput, NamedRef, ScanInput, Scene, SceneFilter, ScenePage, ScenePatch,
    StashJob, StashVersion,
};
use crate::queries;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Base delay for exponential backoff.
const BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Backoff cap.
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Connection settings for the upstream endpoint.
#[derive(Debug, Clone)]
pub struct StashClientConfig {
    /// Base URL, e.g. `http://stash:9999`.
    pub url: String,
    /// Optional static API key sent as the `ApiKey` header.
    pub api_key: Option<String>,
    /// Per-call deadline.
    pub timeout: Duration,
    /// Retry attempts for transient failures.
    pub max_retries: u32,
}

impl StashClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// Typed upstream client.
pub struct StashClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_retries: u32,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQlErrorItem>>,
}

#[derive(Deserialize)]
struct GraphQlErrorItem {
    message: String,
}

impl StashClient {
    pub fn new(config: StashClientConfig) -> Result<Self, StashError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StashError::Connection(e.to_string()))?;
        let endpoint = format!("{}/graphql", config.url.trim_end_matches('/'));
        Ok(Self { http, endpoint, api_key: config.api_key, max_retries: config.max_retries })
    }

    /// Execute one GraphQL operation, retrying transient failures.
    ///
    /// 5xx responses and transport errors are retried with exponential
    /// backoff; 429 is retried honoring `Retry-After`. 401, GraphQL errors,
    /// and malformed bodies are surfaced immediately.
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value, StashError> {
        let body = json!({ "query": query, "variables": variables });
        let mut attempt = 0u32;

        loop {
            let mut request = self.http.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                request = request.header("ApiKey", key);
            }

            let failure = match request.send().await {
                Err(e) => StashError::Connection(e.to_string()),
                Ok(response) => {
                    let status = response.status();
                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(StashError::Auth);
                    }
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = response
                            .headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok());
                        StashError::RateLimit { retry_after }
                    } else if status.is_server_error() {
                        StashError::Connection(format!("server error {status}"))
                    } else if !status.is_success() {
                        return Err(StashError::Connection(format!(
                            "unexpected status {status}"
                        )));
                    } else {
                        let parsed: GraphQlResponse = response
                            .json()
                            .await
                            .map_err(|e| StashError::Decode(e.to_string()))?;
                        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
                            let joined = errors
                                .into_iter()
                                .map(|e| e.message)
                                .collect::<Vec<_>>()
                                .join("; ");
                            return Err(StashError::GraphQl(joined));
                        }
                        return parsed
                            .data
                            .ok_or_else(|| StashError::Decode("missing data".to_string()));
                    }
                }
            };

            if attempt >= self.max_retries {
                return match failure {
                    StashError::RateLimit { .. } => Err(failure),
                    other => Err(StashError::Connection(other.to_string())),
                };
            }

            let delay = match &failure {
                StashError::RateLimit { retry_after: Some(secs) } => Duration::from_secs(*secs),
                _ => BACKOFF_CAP.min(BACKOFF_BASE * 2u32.saturating_pow(attempt)),
            };
            warn!(attempt, delay_ms = delay.as_millis() as u64, error = %failure, "retrying stash request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn field(data: Value, key: &str) -> Result<Value, StashError> {
        match data {
            Value::Object(mut map) => map
                .remove(key)
                .ok_or_else(|| StashError::Decode(format!("missing field {key}"))),
            _ => Err(StashError::Decode(format!("expected object with {key}"))),
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, StashError> {
        serde_json::from_value(value).map_err(|e| StashError::Decode(e.to_string()))
    }

    async fn find_named(
        &self,
        query: &str,
        root: &str,
        list: &str,
        name: Option<&str>,
    ) -> Result<Vec<NamedRef>, StashError> {
        let variables = match name {
            Some(name) => json!({ "filter": { "q": name, "per_page": 100 } }),
            None => json!({ "filter": { "per_page": 100 } }),
        };
        let data = self.execute(query, variables).await?;
        let listing = Self::field(data, root)?;
        let rows = Self::field(listing, list)?;
        Self::decode(rows)
    }
}

#[async_trait]
impl StashApi for StashClient {
    async fn find_scenes(
        &self,
        filter: Option<&SceneFilter>,
        pagination: &FindFilter,
    ) -> Result<ScenePage, StashError> {
        let variables = json!({
            "filter": pagination,
            "scene_filter": filter,
        });
        let data = self.execute(queries::FIND_SCENES, variables).await?;
        Self::decode(Self::field(data, "findScenes")?)
    }

    async fn get_scene(&self, id: &str) -> Result<Option<Scene>, StashError> {
        let scene_id: i64 = match id.parse() {
            Ok(n) => n,
            Err(_) => return Err(StashError::Decode(format!("non-numeric scene id {id:?}"))),
        };
        let data = self
            .execute(queries::FIND_SCENES, json!({ "scene_ids": [scene_id] }))
            .await?;
        let page: ScenePage = Self::decode(Self::field(data, "findScenes")?)?;
        Ok(page.scenes.into_iter().next())
    }

    async fn update_scene(&self, patch: &ScenePatch) -> Result<(), StashError> {
        debug!(scene_id = %patch.id, "sceneUpdate");
        self.execute(queries::SCENE_UPDATE, json!({ "input": patch })).await?;
        Ok(())
    }

    async fn find_performers(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError> {
        self.find_named(queries::FIND_PERFORMERS, "findPerformers", "performers", name).await
    }

    async fn find_tags(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError> {
        self.find_named(queries::FIND_TAGS, "findTags", "tags", name).await
    }

    async fn find_studios(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError> {
        self.find_named(queries::FIND_STUDIOS, "findStudios", "studios", name).await
    }

    async fn create_tag(&self, name: &str) -> Result<NamedRef, StashError> {
        let data = self
            .execute(queries::TAG_CREATE, json!({ "input": { "name": name } }))
            .await?;
        Self::decode(Self::field(data, "tagCreate")?)
    }

    async fn metadata_scan(&self, input: &ScanInput) -> Result<String, StashError> {
        let data = self.execute(queries::METADATA_SCAN, json!({ "input": input })).await?;
        Self::decode(Self::field(data, "metadataScan")?)
    }

    async fn metadata_generate(&self, input: &GenerateInput) -> Result<String, StashError> {
        let data = self.execute(queries::METADATA_GENERATE, json!({ "input": input })).await?;
        Self::decode(Self::field(data, "metadataGenerate")?)
    }

    async fn find_job(&self, id: &str) -> Result<Option<StashJob>, StashError> {
        let data = self
            .execute(queries::FIND_JOB, json!({ "input": { "id": id } }))
            .await?;
        Self::decode(Self::field(data, "findJob")?)
    }

    async fn stop_job(&self, id: &str) -> Result<bool, StashError> {
        let data = self.execute(queries::STOP_JOB, json!({ "job_id": id })).await?;
        Self::decode(Self::field(data, "stopJob")?)
    }

    async fn test_connection(&self) -> Result<StashVersion, StashError> {
        let data = self.execute(queries::VERSION, json!({})).await?;
        Self::decode(Self::field(data, "version")?)
    }
}
