// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root.
//!
//! Every component is constructed exactly once here and passed around as an
//! explicit handle; tests build their own root with a fake upstream.

use crate::auto_sync::AutoStashSyncDaemon;
use crate::config::{Config, ConfigError};
use crate::contract::Daemon;
use crate::supervisor::{DaemonFactory, DaemonSupervisor};
use crate::test_daemon::TestDaemon;
use stashhog_core::{Clock, DaemonKind, SystemClock};
use stashhog_engine::{handlers, EventBus, JobService, PlanManager, SyncCoordinator, TaskRunner};
use stashhog_stash::{StashApi, StashClient, StashClientConfig, StashError};
use stashhog_storage::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// WAL group-commit flush cadence.
const FLUSH_INTERVAL: Duration = Duration::from_millis(50);
/// Checkpoint cadence.
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(300);

/// Errors during startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Stash(#[from] StashError),
}

/// The assembled process: one instance of every component.
pub struct App {
    pub config: Config,
    pub store: Store,
    pub bus: EventBus,
    pub jobs: JobService,
    pub plans: Arc<PlanManager>,
    pub sync: Arc<SyncCoordinator>,
    pub supervisor: DaemonSupervisor,
    pub stash: Arc<dyn StashApi>,
    maintenance: JoinHandle<()>,
}

/// Build against the real upstream client.
pub fn build(config: Config) -> Result<App, BootstrapError> {
    let mut client_config = StashClientConfig::new(config.stash.url.clone());
    client_config.api_key = config.stash.api_key.clone();
    let api: Arc<dyn StashApi> = Arc::new(StashClient::new(client_config)?);
    build_with_api(config, api, Arc::new(SystemClock))
}

/// Build with an injected upstream and clock (tests, fakes).
pub fn build_with_api(
    config: Config,
    api: Arc<dyn StashApi>,
    clock: Arc<dyn Clock>,
) -> Result<App, BootstrapError> {
    let upstream_tz = config.upstream_tz()?;
    let store = Store::open(&config.wal_path(), &config.snapshot_path(), clock)?;

    let stale = store.stale_jobs();
    for job in &stale {
        warn!(job_id = %job.id, job_type = %job.kind, status = %job.status, "stale job from previous run");
    }
    if !stale.is_empty() {
        info!(count = stale.len(), "stale jobs will be failed by the next cleanup run");
    }

    let bus = EventBus::new();
    let runner = TaskRunner::start(config.workers);
    let jobs = JobService::new(store.clone(), bus.clone(), runner);

    let sync = Arc::new(SyncCoordinator::new(store.clone(), Arc::clone(&api), upstream_tz));
    let plans = Arc::new(PlanManager::new(store.clone(), Arc::clone(&api)));
    handlers::register_all(&jobs, Arc::clone(&sync), Arc::clone(&plans), Arc::clone(&api));

    seed_daemons(&store)?;
    let factory = daemon_factory(Arc::clone(&sync));
    let supervisor = DaemonSupervisor::new(store.clone(), bus.clone(), jobs.clone(), factory);

    let maintenance = spawn_maintenance(store.clone());

    Ok(App {
        config,
        store,
        bus,
        jobs,
        plans,
        sync,
        supervisor,
        stash: api,
        maintenance,
    })
}

impl App {
    /// Auto-start daemons; call once after build.
    pub async fn initialize(&self) {
        self.supervisor.initialize().await;
    }

    /// Orderly teardown: daemons, runner, final checkpoint.
    pub async fn shutdown(self) {
        info!("shutting down");
        self.supervisor.shutdown().await;
        self.jobs.shutdown().await;
        self.maintenance.abort();
        match self.store.checkpoint() {
            Ok(seq) => info!(seq, "saved shutdown checkpoint"),
            Err(e) => warn!(error = %e, "failed to save shutdown checkpoint"),
        }
    }
}

/// Register the daemon rows this build knows how to run.
fn seed_daemons(store: &Store) -> Result<(), StoreError> {
    store.ensure_daemon("auto_stash_sync", DaemonKind::AutoStashSync)?;
    store.ensure_daemon("test_daemon", DaemonKind::Test)?;
    Ok(())
}

fn daemon_factory(sync: Arc<SyncCoordinator>) -> DaemonFactory {
    Box::new(move |kind| match kind {
        DaemonKind::AutoStashSync => {
            Some(Arc::new(AutoStashSyncDaemon::new(Arc::clone(&sync))) as Arc<dyn Daemon>)
        }
        DaemonKind::Test => Some(Arc::new(TestDaemon::new()) as Arc<dyn Daemon>),
    })
}

/// Background WAL flusher and periodic checkpointer.
fn spawn_maintenance(store: Store) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_checkpoint = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(FLUSH_INTERVAL).await;
            if let Err(e) = store.flush_if_due() {
                warn!(error = %e, "WAL flush failed");
            }
            if last_checkpoint.elapsed() >= CHECKPOINT_INTERVAL {
                match store.checkpoint() {
                    Ok(seq) => info!(seq, "saved periodic checkpoint"),
                    Err(e) => warn!(error = %e, "periodic checkpoint failed"),
                }
                last_checkpoint = tokio::time::Instant::now();
            }
        }
    })
}
