// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! stashhog-daemon: daemon supervisor, reference daemons, and the
//! `stashhogd` composition root.

pub mod auto_sync;
pub mod bootstrap;
pub mod config;
pub mod contract;
pub mod supervisor;
pub mod test_daemon;

pub use auto_sync::AutoStashSyncDaemon;
pub use bootstrap::{App, BootstrapError};
pub use config::Config;
pub use contract::{Daemon, DaemonContext, DaemonError};
pub use supervisor::{DaemonHealth, DaemonSupervisor, HealthEntry};
pub use test_daemon::TestDaemon;
