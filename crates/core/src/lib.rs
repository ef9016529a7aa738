// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stashhog-core: domain model for the StashHog execution substrate

pub mod macros;

pub mod clock;
pub mod context;
pub mod daemon;
pub mod event;
pub mod id;
pub mod job;
pub mod job_type;
pub mod notify;
pub mod observability;
pub mod params;
pub mod plan;
pub mod sync;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use context::job_span;
pub use daemon::{
    DaemonJobAction, DaemonJobHistory, DaemonKind, DaemonLog, DaemonRecord, DaemonRunStatus,
    LogLevel,
};
pub use event::Event;
pub use id::{DaemonId, JobId, SubscriberId, SyncId, TaskId};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{Job, JobStatus, StatusUpdate};
pub use job_type::{JobType, JobTypeMeta};
pub use notify::{Notification, Topic};
pub use observability::{
    ActivityType, DaemonActivity, DaemonAlert, DaemonError, DaemonMetric, DaemonStatusRow,
    ErrorType,
};
pub use params::JobParams;
pub use plan::{
    AnalysisPlan, ApplyResult, BulkAction, ChangeAction, ChangeCounts, ChangeStatus, NewChange,
    PlanChange, PlanStatus, NO_CHANGES_REASON, PLAN_META_REASON,
};
pub use sync::{SyncCounters, SyncEntityType, SyncHistory, SyncRunStatus};

/// JSON object map used for opaque parameter/metadata/result payloads.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
