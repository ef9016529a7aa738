// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered job handlers.
//!
//! AI analysis handlers live outside this crate; everything the execution
//! substrate itself can fulfill is implemented and wired here.

mod apply_plan;
mod cleanup;
mod stash_ops;
mod sync_jobs;
mod test_job;

pub use apply_plan::ApplyPlanHandler;
pub use cleanup::CleanupHandler;
pub use stash_ops::{StashGenerateHandler, StashScanHandler};
pub use sync_jobs::SyncHandler;
pub use test_job::TestHandler;

use crate::plans::PlanManager;
use crate::service::JobService;
use crate::sync::SyncCoordinator;
use stashhog_core::JobType;
use stashhog_stash::StashApi;
use std::sync::Arc;

/// Register every built-in handler with the job service.
pub fn register_all(
    service: &JobService,
    coordinator: Arc<SyncCoordinator>,
    plans: Arc<PlanManager>,
    api: Arc<dyn StashApi>,
) {
    let sync = Arc::new(SyncHandler::new(coordinator, Arc::clone(&api)));
    for kind in [
        JobType::Sync,
        JobType::SyncScenes,
        JobType::SyncPerformers,
        JobType::SyncTags,
        JobType::SyncStudios,
    ] {
        service.register(kind, sync.clone());
    }

    service.register(JobType::ApplyPlan, Arc::new(ApplyPlanHandler::new(plans)));
    service.register(JobType::StashScan, Arc::new(StashScanHandler::new(Arc::clone(&api))));
    service.register(JobType::StashGenerate, Arc::new(StashGenerateHandler::new(api)));
    service.register(JobType::Cleanup, Arc::new(CleanupHandler::new(service.store())));
    service.register(JobType::Test, Arc::new(TestHandler));
}
