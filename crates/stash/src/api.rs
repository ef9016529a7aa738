// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The upstream API surface, as a trait so the engine and tests can swap in
//! a fake.

use crate::error::StashError;
use crate::models::{
    FindFilter, GenerateInput, NamedRef, ScanInput, Scene, SceneFilter, ScenePage, ScenePatch,
    StashJob, StashVersion,
};
use async_trait::async_trait;

/// Operations the core consumes from the upstream server.
#[async_trait]
pub trait StashApi: Send + Sync {
    async fn find_scenes(
        &self,
        filter: Option<&SceneFilter>,
        pagination: &FindFilter,
    ) -> Result<ScenePage, StashError>;

    /// `Ok(None)` when the scene does not exist upstream.
    async fn get_scene(&self, id: &str) -> Result<Option<Scene>, StashError>;

    async fn update_scene(&self, patch: &ScenePatch) -> Result<(), StashError>;

    async fn find_performers(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError>;

    async fn find_tags(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError>;

    async fn find_studios(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError>;

    async fn create_tag(&self, name: &str) -> Result<NamedRef, StashError>;

    /// Exact-name lookup, creating the tag when absent. Two calls with the
    /// same name return the same tag.
    async fn find_or_create_tag(&self, name: &str) -> Result<NamedRef, StashError> {
        let existing = self.find_tags(Some(name)).await?;
        if let Some(tag) = existing.into_iter().find(|t| t.name.eq_ignore_ascii_case(name)) {
            return Ok(tag);
        }
        self.create_tag(name).await
    }

    /// Trigger a metadata scan; returns the upstream job id.
    async fn metadata_scan(&self, input: &ScanInput) -> Result<String, StashError>;

    /// Trigger metadata generation; returns the upstream job id.
    async fn metadata_generate(&self, input: &GenerateInput) -> Result<String, StashError>;

    async fn find_job(&self, id: &str) -> Result<Option<StashJob>, StashError>;

    async fn stop_job(&self, id: &str) -> Result<bool, StashError>;

    async fn test_connection(&self) -> Result<StashVersion, StashError>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStash;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use crate::models::StashJobStatus;
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, HashSet};

    #[derive(Default)]
    struct FakeInner {
        scenes: BTreeMap<String, Scene>,
        missing_scenes: HashSet<String>,
        tags: Vec<NamedRef>,
        performers: Vec<NamedRef>,
        studios: Vec<NamedRef>,
        next_tag_id: u64,
        /// Scripted `findScenes` count for filtered (incremental) queries.
        pending_count: Option<u64>,
        jobs: BTreeMap<String, StashJob>,
        next_job_id: u64,
        stop_requests: Vec<String>,
        updates: Vec<ScenePatch>,
        fail_updates: HashSet<String>,
        find_scenes_calls: u64,
        find_scenes_error: bool,
    }

    /// In-memory upstream for tests.
    #[derive(Default)]
    pub struct FakeStash {
        inner: Mutex<FakeInner>,
    }

    impl FakeStash {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert_scene(&self, scene: Scene) {
            self.inner.lock().scenes.insert(scene.id.clone(), scene);
        }

        /// A bare scene with just an id and title.
        pub fn seed_scene(&self, id: &str, title: &str) {
            self.insert_scene(Scene {
                id: id.to_string(),
                title: Some(title.to_string()),
                organized: false,
                details: None,
                date: None,
                rating100: None,
                files: Vec::new(),
                performers: Vec::new(),
                tags: Vec::new(),
                studio: None,
                created_at: None,
                updated_at: None,
            });
        }

        /// Make `get_scene` return `None` for this id.
        pub fn set_scene_missing(&self, id: &str) {
            let mut inner = self.inner.lock();
            inner.scenes.remove(id);
            inner.missing_scenes.insert(id.to_string());
        }

        /// Script the count returned for filtered `find_scenes` calls.
        pub fn set_pending_count(&self, count: u64) {
            self.inner.lock().pending_count = Some(count);
        }

        pub fn add_tag(&self, id: &str, name: &str) {
            self.inner.lock().tags.push(NamedRef { id: id.into(), name: name.into() });
        }

        pub fn add_performer(&self, id: &str, name: &str) {
            self.inner.lock().performers.push(NamedRef { id: id.into(), name: name.into() });
        }

        pub fn add_studio(&self, id: &str, name: &str) {
            self.inner.lock().studios.push(NamedRef { id: id.into(), name: name.into() });
        }

        /// Force `update_scene` for this id to fail with a GraphQL error.
        pub fn fail_updates_for(&self, id: &str) {
            self.inner.lock().fail_updates.insert(id.to_string());
        }

        /// Make `find_scenes` fail with a connection error until cleared.
        pub fn set_find_scenes_error(&self, fail: bool) {
            self.inner.lock().find_scenes_error = fail;
        }

        /// Move an upstream job to a new status.
        pub fn set_job_status(&self, id: &str, status: StashJobStatus, progress: f64) {
            if let Some(job) = self.inner.lock().jobs.get_mut(id) {
                job.status = status;
                job.progress = Some(progress);
            }
        }

        pub fn stop_request_count(&self, id: &str) -> usize {
            self.inner.lock().stop_requests.iter().filter(|r| r.as_str() == id).count()
        }

        pub fn scene_updates(&self) -> Vec<ScenePatch> {
            self.inner.lock().updates.clone()
        }

        pub fn find_scenes_calls(&self) -> u64 {
            self.inner.lock().find_scenes_calls
        }

        fn spawn_job(&self, description: &str) -> String {
            let mut inner = self.inner.lock();
            inner.next_job_id += 1;
            let id = format!("stash-job-{}", inner.next_job_id);
            inner.jobs.insert(
                id.clone(),
                StashJob {
                    id: id.clone(),
                    status: StashJobStatus::Running,
                    progress: Some(0.0),
                    description: Some(description.to_string()),
                    start_time: None,
                    end_time: None,
                    error: None,
                },
            );
            id
        }
    }

    #[async_trait]
    impl StashApi for FakeStash {
        async fn find_scenes(
            &self,
            filter: Option<&SceneFilter>,
            pagination: &FindFilter,
        ) -> Result<ScenePage, StashError> {
            let mut inner = self.inner.lock();
            inner.find_scenes_calls += 1;
            if inner.find_scenes_error {
                return Err(StashError::Connection("injected connection failure".to_string()));
            }
            let all: Vec<Scene> = inner.scenes.values().cloned().collect();
            let count = match (filter.and_then(|f| f.updated_at.as_ref()), inner.pending_count) {
                (Some(_), Some(scripted)) => scripted,
                _ => all.len() as u64,
            };
            let start = ((pagination.page.max(1) - 1) * pagination.per_page) as usize;
            let scenes = all
                .into_iter()
                .skip(start)
                .take(pagination.per_page as usize)
                .collect();
            Ok(ScenePage { count, scenes })
        }

        async fn get_scene(&self, id: &str) -> Result<Option<Scene>, StashError> {
            Ok(self.inner.lock().scenes.get(id).cloned())
        }

        async fn update_scene(&self, patch: &ScenePatch) -> Result<(), StashError> {
            let mut inner = self.inner.lock();
            if inner.fail_updates.contains(&patch.id) {
                return Err(StashError::GraphQl(format!("update rejected for {}", patch.id)));
            }
            inner.updates.push(patch.clone());
            Ok(())
        }

        async fn find_performers(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError> {
            let inner = self.inner.lock();
            Ok(filter_named(&inner.performers, name))
        }

        async fn find_tags(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError> {
            let inner = self.inner.lock();
            Ok(filter_named(&inner.tags, name))
        }

        async fn find_studios(&self, name: Option<&str>) -> Result<Vec<NamedRef>, StashError> {
            let inner = self.inner.lock();
            Ok(filter_named(&inner.studios, name))
        }

        async fn create_tag(&self, name: &str) -> Result<NamedRef, StashError> {
            let mut inner = self.inner.lock();
            inner.next_tag_id += 1;
            let tag = NamedRef { id: format!("tag-{}", inner.next_tag_id), name: name.into() };
            inner.tags.push(tag.clone());
            Ok(tag)
        }

        async fn metadata_scan(&self, input: &ScanInput) -> Result<String, StashError> {
            Ok(self.spawn_job(&format!("Scanning {}", input.paths.join(", "))))
        }

        async fn metadata_generate(&self, _input: &GenerateInput) -> Result<String, StashError> {
            Ok(self.spawn_job("Generating metadata"))
        }

        async fn find_job(&self, id: &str) -> Result<Option<StashJob>, StashError> {
            Ok(self.inner.lock().jobs.get(id).cloned())
        }

        async fn stop_job(&self, id: &str) -> Result<bool, StashError> {
            let mut inner = self.inner.lock();
            inner.stop_requests.push(id.to_string());
            if let Some(job) = inner.jobs.get_mut(id) {
                job.status = StashJobStatus::Stopping;
            }
            Ok(true)
        }

        async fn test_connection(&self) -> Result<StashVersion, StashError> {
            Ok(StashVersion {
                version: "fake".to_string(),
                hash: None,
                build_time: None,
            })
        }
    }

    fn filter_named(rows: &[NamedRef], name: Option<&str>) -> Vec<NamedRef> {
        match name {
            Some(name) => rows
                .iter()
                .filter(|r| r.name.to_lowercase().contains(&name.to_lowercase()))
                .cloned()
                .collect(),
            None => rows.to_vec(),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn find_or_create_tag_is_idempotent() {
            let fake = FakeStash::new();
            let first = fake.find_or_create_tag("Outdoors").await.unwrap();
            let second = fake.find_or_create_tag("Outdoors").await.unwrap();
            assert_eq!(first.id, second.id);
            assert_eq!(fake.find_tags(None).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn missing_scene_returns_none() {
            let fake = FakeStash::new();
            fake.seed_scene("1", "one");
            fake.set_scene_missing("1");
            assert!(fake.get_scene("1").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn scripted_pending_count_only_applies_to_filtered_queries() {
            let fake = FakeStash::new();
            fake.seed_scene("1", "one");
            fake.set_pending_count(7);

            let filtered = SceneFilter {
                updated_at: Some(crate::models::TimestampCriterion::greater_than("t")),
            };
            let page = fake
                .find_scenes(Some(&filtered), &FindFilter::default())
                .await
                .unwrap();
            assert_eq!(page.count, 7);

            let unfiltered = fake.find_scenes(None, &FindFilter::default()).await.unwrap();
            assert_eq!(unfiltered.count, 1);
        }
    }
}
