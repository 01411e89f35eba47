//! Offline action facade exposed to the UI layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use timeclock_domain::{
    ClockActionType, ClockPayload, OfflineClockAction, Result, SyncResult, SyncStatus,
};
use tracing::instrument;

use super::engine::SyncEngine;
use super::ports::ActionQueue;
use crate::time::Clock;

/// Queue introspection, direct mutation and the drain operation.
pub struct OfflineActionService {
    queue: Arc<dyn ActionQueue>,
    engine: Arc<SyncEngine>,
    clock: Arc<dyn Clock>,
}

impl OfflineActionService {
    pub fn new(
        queue: Arc<dyn ActionQueue>,
        engine: Arc<SyncEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            queue,
            engine,
            clock,
        }
    }

    pub async fn get_pending_actions(&self) -> Result<Vec<OfflineClockAction>> {
        self.queue.get_all().await
    }

    pub async fn get_failed_actions(&self) -> Result<Vec<OfflineClockAction>> {
        self.queue.get_failed().await
    }

    pub async fn get_pending_count(&self) -> Result<usize> {
        self.queue.count().await
    }

    /// Enqueue a payload.
    ///
    /// `createdAt` is taken from the payload's own action timestamp when it
    /// carries one, otherwise from the clock.
    #[instrument(skip(self, payload))]
    pub async fn save_offline_action(
        &self,
        action_type: ClockActionType,
        payload: Value,
    ) -> Result<OfflineClockAction> {
        let created_at = ClockPayload::timestamp_of(action_type, &payload)
            .unwrap_or_else(|| self.clock.now());
        let action = OfflineClockAction::new(action_type, payload, created_at);
        self.queue.append(&action).await?;
        Ok(action)
    }

    pub async fn remove_action(&self, id: &str) -> Result<()> {
        self.queue.remove_by_id(id).await
    }

    /// Returns the new retry count, `None` for an unknown id.
    pub async fn update_action_retry(&self, id: &str, error: Option<&str>) -> Result<Option<u32>> {
        self.queue.update_retry(id, error).await
    }

    pub async fn cleanup_expired_actions(&self) -> Result<usize> {
        self.queue.cleanup_expired().await
    }

    pub async fn clear_all_actions(&self) -> Result<()> {
        self.queue.clear().await
    }

    /// Run one sync pass directly, bypassing the coordinator's single-flight
    /// guard. UI code should go through `SyncCoordinator::trigger_sync`.
    pub async fn sync_pending_actions(&self) -> Result<SyncResult> {
        self.engine.sync_pending_actions().await
    }

    pub async fn has_pending_actions(&self) -> Result<bool> {
        Ok(self.queue.count().await? > 0)
    }

    pub async fn get_sync_status(&self) -> Result<SyncStatus> {
        let actions = self.queue.get_all().await?;
        let max_retries = self.engine.policy().max_retries;

        Ok(SyncStatus {
            pending_count: actions.len(),
            failed_count: actions.iter().filter(|action| action.is_exhausted(max_retries)).count(),
            last_sync_attempt: self.queue.get_last_sync_timestamp().await?,
        })
    }

    pub async fn save_last_sync_attempt(&self) -> Result<()> {
        self.queue.save_last_sync_timestamp().await
    }

    pub async fn get_last_sync_attempt(&self) -> Result<Option<DateTime<Utc>>> {
        self.queue.get_last_sync_timestamp().await
    }
}
