// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stashhog-storage: durable state for the StashHog core.
//!
//! Mutations are domain events appended to a JSONL write-ahead log and
//! applied to an in-memory materialized state; startup replays the log from
//! the latest snapshot. The [`Store`] facade is the only write path.

mod snapshot;
mod state;
mod store;
mod wal;

pub use snapshot::{Snapshot, SnapshotError};
pub use state::MaterializedState;
pub use store::{JobFilter, Store, StoreError};
pub use wal::{Wal, WalEntry, WalError};
