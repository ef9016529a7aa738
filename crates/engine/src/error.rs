// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-wide error type.

use stashhog_stash::StashError;
use stashhog_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by job-service operations and handlers.
///
/// `Cancelled` is the cooperative-cancellation sentinel: handlers return it
/// after observing the cancellation token and the wrapper records the job as
/// CANCELLED rather than FAILED.
#[derive(Debug, Error)]
pub enum JobError {
    /// Bad input to an operation; surfaced to the caller, never retried.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Cooperative cancellation observed.
    #[error("cancelled")]
    Cancelled,

    /// Upstream failure, preserving the client taxonomy.
    #[error(transparent)]
    Stash(#[from] StashError),

    /// Persistence failure.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Handler-defined failure.
    #[error("{0}")]
    Handler(String),
}
