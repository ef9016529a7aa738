// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! zstd-compressed state checkpoints.
//!
//! A snapshot is `{seq, state}` serialized as JSON and compressed; startup
//! loads the snapshot and replays only WAL entries past `seq`. Writes are
//! atomic (tmp + rename). A corrupt snapshot is rotated to `.bak` and
//! treated as absent, forcing a full WAL replay.

use crate::state::MaterializedState;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// zstd compression level for checkpoints.
const COMPRESSION_LEVEL: i32 = 3;

/// Errors from snapshot save/load.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A checkpoint of the materialized state.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Last WAL sequence number folded into `state`.
    pub seq: u64,
    pub state: MaterializedState,
}

impl Snapshot {
    /// Write a snapshot atomically, returning the compressed size in bytes.
    pub fn save(path: &Path, seq: u64, state: &MaterializedState) -> Result<u64, SnapshotError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(&SnapshotRef { seq, state })?;
        let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)?;

        let tmp = path.with_extension("snapshot.tmp");
        std::fs::write(&tmp, &compressed)?;
        std::fs::rename(&tmp, path)?;

        Ok(compressed.len() as u64)
    }

    /// Load a snapshot, or `None` when absent or unreadable.
    pub fn load(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
        let compressed = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let decoded = match zstd::decode_all(compressed.as_slice()) {
            Ok(bytes) => bytes,
            Err(e) => {
                rotate_corrupt(path, &e);
                return Ok(None);
            }
        };

        match serde_json::from_slice::<Snapshot>(&decoded) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                rotate_corrupt(path, &e);
                Ok(None)
            }
        }
    }
}

fn rotate_corrupt(path: &Path, cause: &dyn std::fmt::Display) {
    let bak = path.with_extension("snapshot.bak");
    warn!(
        path = %path.display(),
        bak = %bak.display(),
        error = %cause,
        "corrupt snapshot, rotating aside and replaying full WAL",
    );
    if let Err(e) = std::fs::rename(path, &bak) {
        warn!(error = %e, "failed to rotate corrupt snapshot");
    }
}

/// Serialization helper to avoid cloning the state on save.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    seq: u64,
    state: &'a MaterializedState,
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
