// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL event write-ahead log with group commit.
//!
//! Every entry is one line of JSON: `{"seq":N,"event":{...}}`. Appends are
//! buffered and flushed in batches (~10ms window or 100 entries) with a
//! single fsync per batch; `flush()` is the durability point. A corrupt tail
//! is rotated to `.bak` at open, keeping the valid prefix.

use serde::{Deserialize, Serialize};
use stashhog_core::Event;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

/// Flush interval for group commit.
const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Maximum buffered entries before a flush is forced.
const FLUSH_THRESHOLD: usize = 100;

/// Errors from WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct RecordRef<'a> {
    seq: u64,
    event: &'a Event,
}

#[derive(Deserialize)]
struct Record {
    seq: u64,
    event: Event,
}

/// One durable log entry.
#[derive(Debug, Clone)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// Append-only JSONL event log.
pub struct Wal {
    file: File,
    path: PathBuf,
    /// Highest sequence number written (buffered or flushed).
    last_seq: u64,
    /// Buffered JSON lines awaiting flush (without trailing newline).
    buffer: Vec<Vec<u8>>,
    last_flush: Instant,
}

impl Wal {
    /// Open or create a WAL at the given path.
    ///
    /// Scans existing entries to find the last sequence number. If a corrupt
    /// line is found, the file is rotated to `.bak` and rewritten with only
    /// the valid prefix.
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).read(true).append(true).open(path)?;
        let (last_seq, valid_lines, corrupt) = Self::scan(&file)?;

        let file = if corrupt {
            drop(file);
            let bak = path.with_extension("wal.bak");
            warn!(
                path = %path.display(),
                bak = %bak.display(),
                valid_entries = valid_lines.len(),
                "corrupt WAL tail detected, rotating and keeping valid prefix",
            );
            std::fs::rename(path, &bak)?;
            let mut rewritten = File::create(path)?;
            for line in &valid_lines {
                rewritten.write_all(line.as_bytes())?;
                rewritten.write_all(b"\n")?;
            }
            rewritten.sync_all()?;
            drop(rewritten);
            OpenOptions::new().create(true).read(true).append(true).open(path)?
        } else {
            file
        };

        Ok(Self {
            file,
            path: path.to_owned(),
            last_seq,
            buffer: Vec::new(),
            last_flush: Instant::now(),
        })
    }

    /// Scan all entries, returning `(last_seq, valid_lines, corrupt)`.
    fn scan(file: &File) -> Result<(u64, Vec<String>, bool), WalError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut last_seq = 0u64;
        let mut valid = Vec::new();
        let mut corrupt = false;
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    corrupt = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<Record>(trimmed) {
                Ok(record) => {
                    last_seq = last_seq.max(record.seq);
                    valid.push(trimmed.to_string());
                }
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }

        Ok((last_seq, valid, corrupt))
    }

    /// Append an event to the write buffer.
    ///
    /// Returns the assigned sequence number. Not durable until [`flush`].
    ///
    /// [`flush`]: Wal::flush
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.last_seq += 1;
        let seq = self.last_seq;
        let bytes = serde_json::to_vec(&RecordRef { seq, event })?;
        self.buffer.push(bytes);
        Ok(seq)
    }

    /// Whether the group-commit window has closed or the buffer is full.
    pub fn needs_flush(&self) -> bool {
        !self.buffer.is_empty()
            && (self.last_flush.elapsed() >= FLUSH_INTERVAL
                || self.buffer.len() >= FLUSH_THRESHOLD)
    }

    /// Write all buffered entries to disk with a single fsync.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        for mut bytes in self.buffer.drain(..) {
            bytes.push(b'\n');
            self.file.write_all(&bytes)?;
        }
        self.file.sync_all()?;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Highest sequence number assigned so far.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// All entries with `seq > after`, in order. Used for startup replay.
    pub fn replay_after(&mut self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        self.flush()?;

        let mut reader = BufReader::new(self.file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut entries = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                Err(e) => return Err(e.into()),
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: Record = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "corrupt WAL entry during replay, stopping");
                    break;
                }
            };
            if record.seq > after {
                entries.push(WalEntry { seq: record.seq, event: record.event });
            }
        }

        Ok(entries)
    }

    /// Drop entries with `seq <= through`, reclaiming space after a
    /// checkpoint. Rewrites atomically via tmp + rename.
    pub fn truncate_through(&mut self, through: u64) -> Result<(), WalError> {
        self.flush()?;

        let kept: Vec<(u64, String)> = {
            let mut reader = BufReader::new(self.file.try_clone()?);
            reader.seek(SeekFrom::Start(0))?;
            let mut kept = Vec::new();
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                    Err(e) => return Err(e.into()),
                }
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Record>(trimmed) {
                    Ok(record) if record.seq > through => {
                        kept.push((record.seq, trimmed.to_string()));
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            kept
        };

        let tmp = self.path.with_extension("wal.tmp");
        {
            let mut tmp_file = File::create(&tmp)?;
            for (_, line) in &kept {
                tmp_file.write_all(line.as_bytes())?;
                tmp_file.write_all(b"\n")?;
            }
            tmp_file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;

        self.file = OpenOptions::new().create(true).read(true).append(true).open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
