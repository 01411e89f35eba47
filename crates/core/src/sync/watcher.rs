//! Connectivity watcher that syncs when the device comes back online.
//!
//! Runs the coordinator's one-shot initial sync when started, then listens
//! for connectivity changes and triggers a pass on every
//! disconnected → connected transition. A pass that is already running when
//! the watcher is stopped is allowed to finish its current action; there is
//! no mid-pass cancellation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use timeclock_core::{ConnectivityWatcher, SyncCoordinator, WatcherConfig};
//!
//! # async fn example(coordinator: Arc<SyncCoordinator>) -> Result<(), String> {
//! let mut watcher = ConnectivityWatcher::new(coordinator, WatcherConfig::default());
//! watcher.start().await?;
//! // ... application runs ...
//! watcher.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::coordinator::{SyncCoordinator, SyncTrigger};

/// Configuration for the connectivity watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// How long `stop` waits for the background task
    pub join_timeout: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Connectivity watcher with explicit lifecycle management.
pub struct ConnectivityWatcher {
    coordinator: Arc<SyncCoordinator>,
    config: WatcherConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ConnectivityWatcher {
    pub fn new(coordinator: Arc<SyncCoordinator>, config: WatcherConfig) -> Self {
        Self {
            coordinator,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Spawn the background task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), String> {
        if self.is_running() {
            return Err("Watcher already running".to_string());
        }

        info!("Starting connectivity watcher");

        self.cancellation = CancellationToken::new();

        // Subscribe before the initial sync so no transition is missed
        let changes = self.coordinator.connectivity().subscribe();
        let coordinator = Arc::clone(&self.coordinator);
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::watch_loop(coordinator, changes, cancel).await;
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Cancel the background task and wait for it.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), String> {
        if !self.is_running() {
            return Err("Watcher not running".to_string());
        }

        info!("Stopping connectivity watcher");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Watcher task panicked: {}", e);
                    return Err("Watcher task panicked".to_string());
                }
                Err(_) => {
                    warn!("Watcher task did not complete within timeout");
                    return Err("Watcher task timeout".to_string());
                }
            }
        }

        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn watch_loop(
        coordinator: Arc<SyncCoordinator>,
        mut changes: watch::Receiver<bool>,
        cancel: CancellationToken,
    ) {
        let mut connected = *changes.borrow_and_update();

        if let Some(outcome) = coordinator.initialize().await {
            log_outcome("initial", &outcome);
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Connectivity watcher cancelled");
                    break;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        debug!("Connectivity source closed; watcher exiting");
                        break;
                    }

                    let now_connected = *changes.borrow_and_update();
                    let restored = !connected && now_connected;
                    connected = now_connected;

                    if restored {
                        info!("Connectivity restored; triggering sync");
                        let outcome = coordinator.trigger_sync().await;
                        log_outcome("reconnect", &outcome);
                    }
                }
            }
        }
    }
}

fn log_outcome(reason: &'static str, outcome: &SyncTrigger) {
    match outcome {
        SyncTrigger::Completed(result) => info!(
            reason,
            synced = result.synced,
            failed = result.failed,
            remaining = result.remaining,
            "Automatic sync finished"
        ),
        SyncTrigger::Aborted { error } => warn!(reason, error = %error, "Automatic sync aborted"),
        SyncTrigger::Offline | SyncTrigger::AlreadySyncing => {
            debug!(reason, outcome = ?outcome, "Automatic sync skipped")
        }
    }
}

impl Drop for ConnectivityWatcher {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ConnectivityWatcher dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use timeclock_domain::{ClockActionType, OfflineClockAction, SubmissionError};

    use super::*;
    use crate::sync::engine::{SyncEngine, SyncPolicy};
    use crate::sync::ports::ActionQueue;
    use crate::sync::queue_store::OfflineQueueStore;
    use crate::sync::test_support::{FakeConnectivity, MemoryStore, ScriptedApi};

    struct Fixture {
        queue: Arc<OfflineQueueStore>,
        api: Arc<ScriptedApi>,
        connectivity: Arc<FakeConnectivity>,
        coordinator: Arc<SyncCoordinator>,
    }

    fn fixture(connected: bool, api: ScriptedApi) -> Fixture {
        let queue = Arc::new(OfflineQueueStore::new(Arc::new(MemoryStore::default())));
        let api = Arc::new(api);
        let connectivity = Arc::new(FakeConnectivity::new(connected));
        let engine =
            Arc::new(SyncEngine::new(queue.clone(), api.clone(), SyncPolicy::without_delay()));
        let coordinator =
            Arc::new(SyncCoordinator::new(engine, queue.clone(), connectivity.clone()));
        Fixture { queue, api, connectivity, coordinator }
    }

    async fn enqueue(queue: &OfflineQueueStore) {
        let action = OfflineClockAction::new(ClockActionType::ClockOut, json!({}), Utc::now());
        queue.append(&action).await.unwrap();
    }

    async fn wait_for_calls(api: &ScriptedApi, expected: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while api.calls().len() < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("api calls did not arrive in time");
    }

    #[tokio::test]
    async fn start_and_stop_lifecycle() {
        let f = fixture(false, ScriptedApi::default());
        let mut watcher = ConnectivityWatcher::new(f.coordinator, WatcherConfig::default());

        assert!(!watcher.is_running());
        watcher.start().await.unwrap();
        assert!(watcher.is_running());
        assert!(watcher.start().await.is_err());

        watcher.stop().await.unwrap();
        assert!(!watcher.is_running());
        assert!(watcher.stop().await.is_err());
    }

    #[tokio::test]
    async fn start_runs_initial_sync_when_online_with_work() {
        let f = fixture(true, ScriptedApi::default());
        enqueue(&f.queue).await;

        let mut watcher = ConnectivityWatcher::new(f.coordinator.clone(), WatcherConfig::default());
        watcher.start().await.unwrap();
        wait_for_calls(&f.api, 1).await;
        watcher.stop().await.unwrap();

        assert_eq!(f.queue.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reconnect_triggers_sync() {
        let f = fixture(false, ScriptedApi::default());
        enqueue(&f.queue).await;

        let mut watcher = ConnectivityWatcher::new(f.coordinator.clone(), WatcherConfig::default());
        watcher.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(f.api.calls().is_empty());

        f.connectivity.set(true);
        wait_for_calls(&f.api, 1).await;
        watcher.stop().await.unwrap();
    }

    #[tokio::test]
    async fn only_restorations_trigger() {
        let f = fixture(true, ScriptedApi::with_script([Err(SubmissionError::network("drop"))]));
        let mut watcher = ConnectivityWatcher::new(f.coordinator.clone(), WatcherConfig::default());
        watcher.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Queue gains work while online: a repeated "connected" is not a restoration
        enqueue(&f.queue).await;
        f.connectivity.set(true);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(f.api.calls().is_empty());

        f.connectivity.set(false);
        tokio::time::sleep(Duration::from_millis(20)).await;
        f.connectivity.set(true);
        wait_for_calls(&f.api, 1).await;

        watcher.stop().await.unwrap();
    }
}
