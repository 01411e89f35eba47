//! Sync engine: one ordered pass over the offline queue.
//!
//! A pass runs retention cleanup, then submits every eligible action oldest
//! first, strictly one at a time. Per-action failures never abort the pass;
//! they are folded into the action's retry count and the pass moves on.
//! Only failures to read the queue itself propagate to the caller.

use std::sync::Arc;
use std::time::Duration;

use timeclock_domain::constants::{MAX_RETRY_COUNT, RETRY_DELAY_MS};
use timeclock_domain::{OfflineClockAction, Result, SubmissionError, SyncResult};
use tracing::{debug, info, instrument, warn};

use super::ports::{ActionQueue, AttendanceApi};

/// Retry policy applied by [`SyncEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Retry count at which an action is skipped for good
    pub max_retries: u32,
    /// Pause after a failed submission before the next action
    pub retry_delay: Duration,
    /// Send 4xx validation rejections straight to the retry ceiling
    pub classify_client_errors_as_permanent: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRY_COUNT,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            classify_client_errors_as_permanent: false,
        }
    }
}

impl SyncPolicy {
    /// Same ceiling, no inter-action delay.
    pub fn without_delay() -> Self {
        Self {
            retry_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

pub struct SyncEngine {
    queue: Arc<dyn ActionQueue>,
    api: Arc<dyn AttendanceApi>,
    policy: SyncPolicy,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<dyn ActionQueue>,
        api: Arc<dyn AttendanceApi>,
        policy: SyncPolicy,
    ) -> Self {
        Self { queue, api, policy }
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    /// Drain the queue once.
    ///
    /// Records the last sync attempt at the end of every pass, including a
    /// pass over an empty queue.
    #[instrument(skip(self))]
    pub async fn sync_pending_actions(&self) -> Result<SyncResult> {
        let expired = self.queue.cleanup_expired().await?;
        if expired > 0 {
            debug!(expired, "Dropped expired actions before sync");
        }

        let mut actions = self.queue.get_all().await?;
        if actions.is_empty() {
            debug!("No pending actions to sync");
            self.record_attempt().await;
            return Ok(SyncResult::default());
        }

        // Stable sort keeps storage order for equal timestamps
        actions.sort_by_key(|action| action.created_at);

        info!(count = actions.len(), "Syncing offline clock actions");

        let mut result = SyncResult::default();
        let total = actions.len();

        for (index, action) in actions.iter().enumerate() {
            if action.is_exhausted(self.policy.max_retries) {
                debug!(
                    action_id = %action.id,
                    retry_count = action.retry_count,
                    "Skipping action past retry ceiling"
                );
                result.failed += 1;
                continue;
            }

            match self.api.submit(action.action_type, &action.payload).await {
                Ok(()) => {
                    if let Err(err) = self.queue.remove_by_id(&action.id).await {
                        // Submitted but still queued; counts as a failed
                        // attempt and will be resent on the next pass
                        warn!(
                            action_id = %action.id,
                            error = %err,
                            "Failed to remove synced action"
                        );
                        self.record_failure(action, &err.to_string(), false, &mut result).await;
                    } else {
                        debug!(
                            action_id = %action.id,
                            action_type = %action.action_type,
                            "Synced action"
                        );
                        result.synced += 1;
                    }
                }
                Err(err) => {
                    self.handle_submission_error(action, &err, &mut result).await;

                    if index + 1 < total && !self.policy.retry_delay.is_zero() {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        self.record_attempt().await;

        let remaining = self.queue.count().await?;
        result.remaining = remaining;

        info!(
            synced = result.synced,
            failed = result.failed,
            remaining = result.remaining,
            "Sync pass completed"
        );

        Ok(result)
    }

    async fn handle_submission_error(
        &self,
        action: &OfflineClockAction,
        err: &SubmissionError,
        result: &mut SyncResult,
    ) {
        warn!(
            action_id = %action.id,
            action_type = %action.action_type,
            kind = %err.kind(),
            status = ?err.status(),
            error = %err,
            "Submitting offline action failed"
        );

        let permanent = self.policy.classify_client_errors_as_permanent && !err.should_retry();
        self.record_failure(action, &err.user_message(), permanent, result).await;
    }

    async fn record_failure(
        &self,
        action: &OfflineClockAction,
        message: &str,
        permanent: bool,
        result: &mut SyncResult,
    ) {
        let reason = truncate_reason(message);
        let updated = if permanent {
            self.queue.mark_exhausted(&action.id, Some(&reason)).await
        } else {
            self.queue.update_retry(&action.id, Some(&reason)).await
        };

        let retry_count = match updated {
            Ok(Some(count)) => count,
            Ok(None) => {
                debug!(action_id = %action.id, "Action disappeared before its retry was recorded");
                action.retry_count.saturating_add(1)
            }
            Err(err) => {
                warn!(action_id = %action.id, error = %err, "Failed to record retry");
                action.retry_count.saturating_add(1)
            }
        };

        if retry_count >= self.policy.max_retries {
            info!(action_id = %action.id, retry_count, "Action reached retry ceiling");
            result.failed += 1;
        }
    }

    async fn record_attempt(&self) {
        if let Err(err) = self.queue.save_last_sync_timestamp().await {
            warn!(error = %err, "Failed to record last sync attempt");
        }
    }
}

fn truncate_reason(reason: &str) -> String {
    const MAX_LEN: usize = 256;
    if reason.chars().count() <= MAX_LEN {
        return reason.to_string();
    }

    let mut truncated = reason.chars().take(MAX_LEN - 3).collect::<String>();
    truncated.push_str("...");
    truncated
}
