// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Apply-plan job handler.

use crate::error::JobError;
use crate::plans::PlanManager;
use crate::service::{JobContext, JobHandler};
use async_trait::async_trait;
use stashhog_core::{JobParams, JsonMap};
use std::sync::Arc;

pub struct ApplyPlanHandler {
    plans: Arc<PlanManager>,
}

impl ApplyPlanHandler {
    pub fn new(plans: Arc<PlanManager>) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl JobHandler for ApplyPlanHandler {
    async fn run(&self, ctx: JobContext) -> Result<JsonMap, JobError> {
        let (plan_id, change_ids) = match &ctx.params {
            JobParams::ApplyPlan { plan_id, change_ids } => (*plan_id, change_ids.clone()),
            other => {
                return Err(JobError::Validation(format!(
                    "unexpected parameters for apply_plan job: {other:?}"
                )));
            }
        };

        ctx.check_cancelled()?;
        ctx.reporter
            .set_progress(0, Some(&format!("Applying plan {plan_id}")))
            .await?;

        let result = self.plans.apply_plan(plan_id, change_ids).await?;

        let summary = format!(
            "Applied {} of {} changes ({} skipped, {} failed)",
            result.applied, result.total, result.skipped, result.failed
        );
        ctx.reporter.set_progress(100, Some(&summary)).await?;

        let mut map = result.to_json_map();
        map.insert("plan_id".into(), plan_id.into());
        Ok(map)
    }
}
