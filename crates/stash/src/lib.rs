// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stashhog-stash: typed client for the upstream Stash GraphQL endpoint.

mod api;
mod client;
mod error;
mod models;
mod poll;
pub mod queries;

pub use api::StashApi;
#[cfg(any(test, feature = "test-support"))]
pub use api::FakeStash;
pub use client::{StashClient, StashClientConfig};
pub use error::StashError;
pub use models::{
    upstream_timestamp, FindFilter, GenerateInput, NamedRef, ScanInput, Scene, SceneFile,
    SceneFilter, ScenePage, ScenePatch, StashJob, StashJobStatus, StashVersion,
    TimestampCriterion, DEFAULT_UPSTREAM_TIMEZONE,
};
pub use poll::{poll_stash_job, PollOutcome, POLL_INTERVAL};
