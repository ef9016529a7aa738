// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-type mutual-exclusion locks.
//!
//! One named async mutex per lock key (see `JobType::lock_key`): the
//! analysis family shares one, the sync family another, and each remaining
//! non-concurrent type serializes on its own name. Locks are created lazily
//! and live for the process lifetime.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// Lazily-populated table of named locks.
#[derive(Clone, Default)]
pub struct TypeLocks {
    locks: Arc<Mutex<HashMap<&'static str, Arc<AsyncMutex<()>>>>>,
}

impl TypeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared mutex for a lock key.
    pub fn handle(&self, key: &'static str) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.locks.lock().entry(key).or_default())
    }

    /// Whether the named lock is currently held.
    pub fn is_held(&self, key: &'static str) -> bool {
        self.handle(key).try_lock().is_err()
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
