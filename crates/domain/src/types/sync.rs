//! Sync pass results and queue summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one drain of the offline queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Actions accepted by the server and removed from the queue
    pub synced: usize,
    /// Actions at or past the retry ceiling (skipped or newly exhausted)
    pub failed: usize,
    /// Queue length after the pass
    pub remaining: usize,
}

/// Summary shown by the UI badges. Derived, never persisted as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub pending_count: usize,
    pub failed_count: usize,
    pub last_sync_attempt: Option<DateTime<Utc>>,
}
