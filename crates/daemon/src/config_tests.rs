// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_without_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();
    assert_eq!(config.stash.url, "http://localhost:9999");
    assert_eq!(config.stash.timezone, "America/Los_Angeles");
    assert!(config.stash.api_key.is_none());
    assert!(config.workers >= 1);
    assert!(config.wal_path().starts_with(dir.path()));
    config.upstream_tz().unwrap();
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        r#"
workers = 3

[stash]
url = "http://stash.lan:9999"
api_key = "secret"
timezone = "UTC"
"#,
    )
    .unwrap();

    let config = Config::for_state_dir(dir.path()).unwrap();
    assert_eq!(config.workers, 3);
    assert_eq!(config.stash.url, "http://stash.lan:9999");
    assert_eq!(config.stash.api_key.as_deref(), Some("secret"));
    assert_eq!(config.upstream_tz().unwrap(), chrono_tz::UTC);
}

#[test]
fn malformed_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "workers = \"many\"").unwrap();
    assert!(matches!(
        Config::for_state_dir(dir.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn bogus_timezone_is_rejected_at_parse() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[stash]\ntimezone = \"Mars/Olympus_Mons\"\n",
    )
    .unwrap();
    let config = Config::for_state_dir(dir.path()).unwrap();
    assert!(matches!(config.upstream_tz(), Err(ConfigError::BadTimezone(_))));
}
