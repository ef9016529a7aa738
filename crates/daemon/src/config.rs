// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: state-directory layout plus upstream settings.
//!
//! Values come from `config.toml` in the state directory, overridden by
//! `STASHHOG_*` environment variables.

use serde::Deserialize;
use stashhog_stash::DEFAULT_UPSTREAM_TIMEZONE;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid upstream timezone: {0}")]
    BadTimezone(String),
}

/// Upstream server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashSettings {
    pub url: String,
    pub api_key: Option<String>,
    /// Timezone the upstream interprets timestamp filters in.
    pub timezone: String,
}

impl Default for StashSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:9999".to_string(),
            api_key: None,
            timezone: DEFAULT_UPSTREAM_TIMEZONE.to_string(),
        }
    }
}

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/stashhog).
    pub state_dir: PathBuf,
    /// Worker-pool width.
    pub workers: usize,
    pub stash: StashSettings,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    workers: Option<usize>,
    #[serde(default)]
    stash: FileStash,
}

#[derive(Debug, Default, Deserialize)]
struct FileStash {
    url: Option<String>,
    api_key: Option<String>,
    timezone: Option<String>,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// State dir: `$STASHHOG_STATE_DIR`, or the platform state directory.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = match std::env::var_os("STASHHOG_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .ok_or(ConfigError::NoStateDir)?
                .join("stashhog"),
        };
        let mut config = Self::for_state_dir(&state_dir)?;

        if let Ok(url) = std::env::var("STASHHOG_STASH_URL") {
            config.stash.url = url;
        }
        if let Ok(key) = std::env::var("STASHHOG_STASH_API_KEY") {
            config.stash.api_key = Some(key);
        }
        if let Ok(workers) = std::env::var("STASHHOG_WORKERS") {
            if let Ok(n) = workers.parse::<usize>() {
                config.workers = n.max(1);
            }
        }
        Ok(config)
    }

    /// Configuration rooted at an explicit state directory, reading its
    /// `config.toml` when present.
    pub fn for_state_dir(state_dir: &Path) -> Result<Self, ConfigError> {
        let file: FileConfig = match std::fs::read_to_string(state_dir.join("config.toml")) {
            Ok(raw) => toml::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => return Err(e.into()),
        };

        let defaults = StashSettings::default();
        Ok(Self {
            state_dir: state_dir.to_owned(),
            workers: file.workers.unwrap_or(stashhog_engine::DEFAULT_WORKERS).max(1),
            stash: StashSettings {
                url: file.stash.url.unwrap_or(defaults.url),
                api_key: file.stash.api_key,
                timezone: file.stash.timezone.unwrap_or(defaults.timezone),
            },
        })
    }

    pub fn wal_path(&self) -> PathBuf {
        self.state_dir.join("wal").join("events.wal")
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join("state.snapshot")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    /// Parse the configured upstream timezone.
    pub fn upstream_tz(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.stash
            .timezone
            .parse()
            .map_err(|_| ConfigError::BadTimezone(self.stash.timezone.clone()))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
