//! Durable queue of offline clock actions.
//!
//! The whole queue lives as one JSON array under [`OFFLINE_ACTIONS_KEY`] in
//! the device key-value store; the last sync attempt lives separately under
//! [`LAST_SYNC_ATTEMPT_KEY`]. Mutations are read-modify-write of the full
//! list, serialized through an async mutex so two callers can never persist
//! interleaved copies.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use timeclock_domain::constants::{
    DATA_RETENTION_DAYS, LAST_SYNC_ATTEMPT_KEY, MAX_RETRY_COUNT, OFFLINE_ACTIONS_KEY,
};
use timeclock_domain::{OfflineClockAction, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ports::{ActionQueue, DiagnosticEvent, DiagnosticsSink, KeyValueStore, NoopDiagnostics};
use crate::time::{Clock, SystemClock};

/// [`ActionQueue`] backed by a [`KeyValueStore`].
pub struct OfflineQueueStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    max_retries: u32,
    retention: Duration,
    write_lock: Mutex<()>,
}

impl OfflineQueueStore {
    /// Create a store with the fixed retry ceiling and retention window.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            diagnostics: Arc::new(NoopDiagnostics),
            max_retries: MAX_RETRY_COUNT,
            retention: Duration::days(DATA_RETENTION_DAYS),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn load(&self) -> Result<Vec<OfflineClockAction>> {
        let Some(raw) = self.storage.get_item(OFFLINE_ACTIONS_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<OfflineClockAction>>(&raw) {
            Ok(actions) => Ok(actions),
            Err(err) => {
                warn!(
                    key = OFFLINE_ACTIONS_KEY,
                    error = %err,
                    "Offline queue blob is unreadable; treating queue as empty"
                );
                self.diagnostics.report(DiagnosticEvent::CorruptQueue {
                    key: OFFLINE_ACTIONS_KEY.to_string(),
                    error: err.to_string(),
                    length: raw.len(),
                });
                Ok(Vec::new())
            }
        }
    }

    async fn persist(&self, actions: &[OfflineClockAction]) -> Result<()> {
        let raw = serde_json::to_string(actions)?;
        self.storage.set_item(OFFLINE_ACTIONS_KEY, &raw).await
    }

    /// Apply `bump` to the action with `id` and persist; `None` if absent.
    async fn mutate_retry<F>(&self, id: &str, error: Option<&str>, bump: F) -> Result<Option<u32>>
    where
        F: FnOnce(u32) -> u32 + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut actions = self.load().await?;

        let Some(action) = actions.iter_mut().find(|action| action.id == id) else {
            debug!(action_id = %id, "Retry update for unknown action ignored");
            return Ok(None);
        };

        // max() keeps the count monotonic whatever the bump does
        action.retry_count = bump(action.retry_count).max(action.retry_count);
        action.last_error = error.map(str::to_string);
        let retry_count = action.retry_count;

        self.persist(&actions).await?;
        Ok(Some(retry_count))
    }
}

#[async_trait]
impl ActionQueue for OfflineQueueStore {
    async fn get_all(&self) -> Result<Vec<OfflineClockAction>> {
        self.load().await
    }

    async fn append(&self, action: &OfflineClockAction) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut actions = self.load().await?;

        // Replace rather than duplicate if the same record is appended twice
        actions.retain(|existing| existing.id != action.id);
        actions.push(action.clone());

        self.persist(&actions).await?;
        info!(
            action_id = %action.id,
            action_type = %action.action_type,
            queued = actions.len(),
            "Queued offline clock action"
        );
        Ok(())
    }

    async fn remove_by_id(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut actions = self.load().await?;
        let before = actions.len();
        actions.retain(|action| action.id != id);

        if actions.len() == before {
            debug!(action_id = %id, "Remove for unknown action ignored");
        }

        self.persist(&actions).await
    }

    async fn update_retry(&self, id: &str, error: Option<&str>) -> Result<Option<u32>> {
        self.mutate_retry(id, error, |count| count.saturating_add(1)).await
    }

    async fn mark_exhausted(&self, id: &str, error: Option<&str>) -> Result<Option<u32>> {
        let ceiling = self.max_retries;
        self.mutate_retry(id, error, |count| count.saturating_add(1).max(ceiling)).await
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now();
        let mut actions = self.load().await?;
        let before = actions.len();
        actions.retain(|action| !action.is_expired(now, self.retention));
        let removed = before - actions.len();

        if removed > 0 {
            self.persist(&actions).await?;
            info!(
                removed,
                retention_days = self.retention.num_days(),
                "Removed expired offline actions"
            );
        }

        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.remove_item(OFFLINE_ACTIONS_KEY).await?;
        info!("Cleared offline action queue");
        Ok(())
    }

    async fn get_failed(&self) -> Result<Vec<OfflineClockAction>> {
        let actions = self.load().await?;
        Ok(actions.into_iter().filter(|action| action.is_exhausted(self.max_retries)).collect())
    }

    async fn save_last_sync_timestamp(&self) -> Result<()> {
        let now = self.clock.now();
        self.storage.set_item(LAST_SYNC_ATTEMPT_KEY, &now.to_rfc3339()).await
    }

    async fn get_last_sync_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.storage.get_item(LAST_SYNC_ATTEMPT_KEY).await? else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(parsed) => Ok(Some(parsed.with_timezone(&Utc))),
            Err(err) => {
                warn!(key = LAST_SYNC_ATTEMPT_KEY, error = %err, "Unreadable last sync timestamp");
                self.diagnostics.report(DiagnosticEvent::CorruptTimestamp {
                    key: LAST_SYNC_ATTEMPT_KEY.to_string(),
                    value: raw,
                });
                Ok(None)
            }
        }
    }
}
