//! Single-flight sync coordinator.
//!
//! Owns the `Idle`/`Syncing` state and the counters the UI renders. A
//! trigger while offline or while a pass is running is dropped, never
//! queued. State is published through a `watch` channel so any number of
//! observers can follow it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use timeclock_domain::{Result, SyncResult};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::engine::SyncEngine;
use super::ports::{ActionQueue, ConnectivityMonitor};

/// Coordinator-level sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    #[default]
    Idle,
    Syncing,
}

timeclock_domain::impl_domain_status_conversions!(CoordinatorState {
    Idle => "idle",
    Syncing => "syncing",
});

/// Observable coordinator state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorSnapshot {
    pub state: CoordinatorState,
    pub pending_count: usize,
    pub last_result: Option<SyncResult>,
    /// Message of the last pass that could not run to completion
    pub last_error: Option<String>,
}

/// Outcome of [`SyncCoordinator::trigger_sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Device offline; nothing attempted
    Offline,
    /// Another pass was in flight; this trigger was dropped
    AlreadySyncing,
    Completed(SyncResult),
    /// The pass could not read the queue
    Aborted { error: String },
}

pub struct SyncCoordinator {
    engine: Arc<SyncEngine>,
    queue: Arc<dyn ActionQueue>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    snapshot: watch::Sender<CoordinatorSnapshot>,
    initial_sync_fired: AtomicBool,
}

impl SyncCoordinator {
    pub fn new(
        engine: Arc<SyncEngine>,
        queue: Arc<dyn ActionQueue>,
        connectivity: Arc<dyn ConnectivityMonitor>,
    ) -> Self {
        Self {
            engine,
            queue,
            connectivity,
            snapshot: watch::Sender::new(CoordinatorSnapshot::default()),
            initial_sync_fired: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> CoordinatorState {
        self.snapshot.borrow().state
    }

    pub fn is_syncing(&self) -> bool {
        self.state() == CoordinatorState::Syncing
    }

    pub fn connectivity(&self) -> &Arc<dyn ConnectivityMonitor> {
        &self.connectivity
    }

    /// Run one sync pass unless offline or already syncing.
    #[instrument(skip(self))]
    pub async fn trigger_sync(&self) -> SyncTrigger {
        if !self.connectivity.is_connected() {
            debug!("Sync trigger ignored while offline");
            return SyncTrigger::Offline;
        }

        // Check-and-set under the channel lock
        let acquired = self.snapshot.send_if_modified(|snapshot| {
            if snapshot.state == CoordinatorState::Syncing {
                return false;
            }
            snapshot.state = CoordinatorState::Syncing;
            true
        });

        if !acquired {
            debug!("Sync already in progress; trigger dropped");
            return SyncTrigger::AlreadySyncing;
        }

        let _idle = IdleOnDrop(&self.snapshot);

        match self.engine.sync_pending_actions().await {
            Ok(result) => {
                self.snapshot.send_modify(|snapshot| {
                    snapshot.pending_count = result.remaining;
                    snapshot.last_result = Some(result);
                    snapshot.last_error = None;
                });
                SyncTrigger::Completed(result)
            }
            Err(err) => {
                warn!(error = %err, "Sync pass aborted");
                let error = err.to_string();
                self.snapshot.send_modify(|snapshot| snapshot.last_error = Some(error.clone()));
                SyncTrigger::Aborted { error }
            }
        }
    }

    /// Re-read the queue length without syncing.
    pub async fn refresh_pending_count(&self) -> Result<usize> {
        let count = self.queue.count().await?;
        self.snapshot.send_if_modified(|snapshot| {
            let changed = snapshot.pending_count != count;
            snapshot.pending_count = count;
            changed
        });
        Ok(count)
    }

    /// Startup hook: refresh counters and, if online with work queued, run
    /// the one automatic initial sync. Later calls only refresh.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Option<SyncTrigger> {
        let pending = match self.refresh_pending_count().await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "Failed to read pending count during initialization");
                return None;
            }
        };

        if !self.connectivity.is_connected() || pending == 0 {
            return None;
        }

        if self.initial_sync_fired.swap(true, Ordering::SeqCst) {
            return None;
        }

        info!(pending, "Running initial sync");
        Some(self.trigger_sync().await)
    }
}

/// Returns the coordinator to `Idle` even if the pass future is dropped.
struct IdleOnDrop<'a>(&'a watch::Sender<CoordinatorSnapshot>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|snapshot| snapshot.state = CoordinatorState::Idle);
    }
}
