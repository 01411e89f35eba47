//! Application context - dependency injection container
//!
//! Builds every adapter and service from a [`Config`] and owns the
//! connectivity watcher's lifecycle. The host feeds reachability into
//! [`AppContext::connectivity`] and calls the services; nothing else needs
//! wiring.

use std::sync::Arc;

use timeclock_core::{
    ActionFactory, ActionQueue, AttendanceService, ConnectivityMonitor, ConnectivityWatcher,
    KeyValueStore, OfflineActionService, OfflineQueueStore, SyncCoordinator, SyncEngine,
    SyncPolicy, SystemClock, WatcherConfig,
};
use timeclock_domain::{Config, Result, TimeclockError};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::api::{AttendanceApiClient, AttendanceApiConfig, StaticTokenProvider};
use crate::observability::{init_tracing, TracingDiagnostics};
use crate::platform::{resolve_device_info, WatchConnectivity};
use crate::storage::SqliteKeyValueStore;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<SqliteKeyValueStore>,
    pub queue: Arc<OfflineQueueStore>,
    pub connectivity: Arc<WatchConnectivity>,
    pub tokens: Arc<StaticTokenProvider>,
    pub coordinator: Arc<SyncCoordinator>,
    pub offline_actions: Arc<OfflineActionService>,
    pub attendance: Arc<AttendanceService>,
    watcher: Mutex<ConnectivityWatcher>,
}

impl AppContext {
    /// Load configuration, install logging and build the context.
    pub async fn bootstrap() -> Result<Self> {
        let config = crate::config::load()?;
        init_tracing(&config.logging);
        Self::new(config).await
    }

    /// Build every component with the production policy. The device starts
    /// out offline until the host reports otherwise.
    pub async fn new(config: Config) -> Result<Self> {
        Self::with_policy(config, SyncPolicy::default()).await
    }

    #[instrument(skip_all, fields(storage = %config.storage.path, base_url = %config.api.base_url))]
    pub async fn with_policy(config: Config, policy: SyncPolicy) -> Result<Self> {
        let clock = Arc::new(SystemClock);
        let storage = Arc::new(SqliteKeyValueStore::from_config_path(&config.storage.path)?);
        let kv: Arc<dyn KeyValueStore> = storage.clone();

        let queue = Arc::new(
            OfflineQueueStore::new(Arc::clone(&kv))
                .with_clock(clock.clone())
                .with_diagnostics(Arc::new(TracingDiagnostics))
                .with_max_retries(policy.max_retries),
        );
        let queue_port: Arc<dyn ActionQueue> = queue.clone();

        let tokens = Arc::new(StaticTokenProvider::new(config.api.access_token.clone()));
        let api = Arc::new(AttendanceApiClient::new(
            AttendanceApiConfig::from(&config.api),
            tokens.clone(),
        )?);

        let connectivity = Arc::new(WatchConnectivity::default());
        let connectivity_port: Arc<dyn ConnectivityMonitor> = connectivity.clone();

        let engine = Arc::new(SyncEngine::new(Arc::clone(&queue_port), api.clone(), policy));
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&engine),
            Arc::clone(&queue_port),
            Arc::clone(&connectivity_port),
        ));

        let device = Arc::new(resolve_device_info(&config.device, kv.as_ref()).await?);
        let factory = ActionFactory::new(clock.clone(), device);

        let offline_actions = Arc::new(OfflineActionService::new(
            Arc::clone(&queue_port),
            Arc::clone(&engine),
            clock,
        ));
        let attendance = Arc::new(AttendanceService::new(
            factory,
            api,
            queue_port,
            connectivity_port,
            Arc::clone(&coordinator),
        ));

        let watcher = ConnectivityWatcher::new(Arc::clone(&coordinator), WatcherConfig::default());

        info!("Application context ready");

        Ok(Self {
            config,
            storage,
            queue,
            connectivity,
            tokens,
            coordinator,
            offline_actions,
            attendance,
            watcher: Mutex::new(watcher),
        })
    }

    /// Start the connectivity watcher (runs the initial sync when online).
    pub async fn start(&self) -> Result<()> {
        self.watcher.lock().await.start().await.map_err(TimeclockError::Internal)
    }

    /// Stop the connectivity watcher. Stopping an idle context is a no-op.
    pub async fn shutdown(&self) -> Result<()> {
        let mut watcher = self.watcher.lock().await;
        if !watcher.is_running() {
            return Ok(());
        }
        watcher.stop().await.map_err(TimeclockError::Internal)?;
        info!("Application context shut down");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.watcher.lock().await.is_running()
    }
}
