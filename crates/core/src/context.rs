// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job log-context propagation.
//!
//! Any code running inside a job span has `job_type`, `job_id`, and (when
//! present) `parent_job_id` attached to its log records. Spans nest; leaving
//! a span restores the enclosing context. Handlers are instrumented with
//! `handler.run(ctx).instrument(job_span(...))` so the context follows the
//! future across await points.

use crate::id::JobId;
use crate::job_type::JobType;
use tracing::Span;

/// Create the tracing span for one job execution.
pub fn job_span(job_id: JobId, job_type: JobType, parent_job_id: Option<JobId>) -> Span {
    match parent_job_id {
        Some(parent) => tracing::info_span!(
            "job",
            job_type = %job_type,
            job_id = %job_id,
            parent_job_id = %parent,
        ),
        None => tracing::info_span!(
            "job",
            job_type = %job_type,
            job_id = %job_id,
        ),
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
