// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream error taxonomy.

use thiserror::Error;

/// Errors surfaced by the Stash client.
#[derive(Debug, Error)]
pub enum StashError {
    /// TCP/DNS/TLS failure, timeout, or exhausted 5xx retries.
    #[error("stash connection error: {0}")]
    Connection(String),

    /// HTTP 401.
    #[error("stash authentication failed")]
    Auth,

    /// HTTP 429 after retries; `retry_after` from the response when present.
    #[error("stash rate limited")]
    RateLimit { retry_after: Option<u64> },

    /// 200 response carrying a non-empty `errors` array.
    #[error("stash graphql error: {0}")]
    GraphQl(String),

    /// Response body did not match the expected shape.
    #[error("unexpected stash response: {0}")]
    Decode(String),
}

impl StashError {
    /// Whether a retry loop may try again (used for 5xx and rate limits).
    pub fn is_transient(&self) -> bool {
        matches!(self, StashError::Connection(_) | StashError::RateLimit { .. })
    }
}
