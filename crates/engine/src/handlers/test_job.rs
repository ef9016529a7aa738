// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test job: staged progress with cooperative cancellation, used by the
//! test daemon and for exercising the pipeline end to end.

use crate::error::JobError;
use crate::service::{JobContext, JobHandler};
use async_trait::async_trait;
use stashhog_core::{JobParams, JsonMap};
use std::time::Duration;

pub struct TestHandler;

#[async_trait]
impl JobHandler for TestHandler {
    async fn run(&self, ctx: JobContext) -> Result<JsonMap, JobError> {
        let (steps, delay_ms, fail_at) = match &ctx.params {
            JobParams::Test { steps, step_delay_ms, fail_at_step } => {
                ((*steps).max(1), *step_delay_ms, *fail_at_step)
            }
            JobParams::Empty => (5, 1000, None),
            other => {
                return Err(JobError::Validation(format!(
                    "unexpected parameters for test job: {other:?}"
                )));
            }
        };

        for step in 1..=steps {
            ctx.check_cancelled()?;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            if fail_at == Some(step) {
                return Err(JobError::Handler(format!("Test job failed at step {step}")));
            }
            let pct = ((step * 100) / steps).min(100) as u8;
            ctx.reporter
                .set_progress(pct, Some(&format!("Step {step} of {steps}")))
                .await?;
        }

        let mut result = JsonMap::new();
        result.insert("steps_completed".into(), steps.into());
        Ok(result)
    }
}
