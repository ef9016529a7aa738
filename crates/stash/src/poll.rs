// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling primitive for upstream-driven jobs (scan/generate).

use crate::api::StashApi;
use crate::error::StashError;
use crate::models::StashJobStatus;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Tick interval between `findJob` polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Terminal outcome of an upstream job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// Poll an upstream job until it reaches a terminal state.
///
/// Progress is reported via `progress` only when the percentage changes.
/// When `cancel` fires, `stopJob` is requested upstream exactly once and
/// polling continues until the upstream reports a terminal state (STOPPING
/// keeps polling). Transient `findJob` errors are logged and retried on the
/// next tick.
pub async fn poll_stash_job<F, Fut>(
    api: &dyn StashApi,
    upstream_job_id: &str,
    label: &str,
    mut progress: F,
    cancel: &CancellationToken,
) -> Result<PollOutcome, StashError>
where
    F: FnMut(u8, String) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut last_progress: Option<u8> = None;
    let mut stop_requested = false;

    loop {
        if cancel.is_cancelled() && !stop_requested {
            info!(upstream_job_id, "requesting upstream job stop");
            if let Err(e) = api.stop_job(upstream_job_id).await {
                // Marked requested regardless, so the stop is never retried.
                warn!(upstream_job_id, error = %e, "failed to stop upstream job");
            }
            stop_requested = true;
        }

        match api.find_job(upstream_job_id).await {
            Err(e) => {
                warn!(upstream_job_id, error = %e, "error polling upstream job");
            }
            Ok(None) => {
                return Ok(PollOutcome::Failed(format!(
                    "job {upstream_job_id} not found upstream"
                )));
            }
            Ok(Some(job)) => {
                let pct = (job.progress.unwrap_or(0.0).clamp(0.0, 1.0) * 100.0).round() as u8;
                if last_progress != Some(pct) {
                    let description = job.description.clone().unwrap_or_default();
                    progress(pct, format!("{label}: {description}")).await;
                    last_progress = Some(pct);
                }

                match job.status {
                    StashJobStatus::Finished => return Ok(PollOutcome::Completed),
                    StashJobStatus::Failed => {
                        let error = job
                            .error
                            .unwrap_or_else(|| format!("{label} failed upstream"));
                        return Ok(PollOutcome::Failed(error));
                    }
                    StashJobStatus::Cancelled => return Ok(PollOutcome::Cancelled),
                    StashJobStatus::Ready
                    | StashJobStatus::Running
                    | StashJobStatus::Stopping => {}
                }
            }
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
