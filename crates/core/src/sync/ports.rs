//! Port interfaces for offline queueing and sync

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use timeclock_domain::{
    ClockActionType, DeviceInfo, OfflineClockAction, Result, SubmissionError,
};
use tokio::sync::watch;

/// On-device string key-value storage (the persistence primitive the queue
/// sits on).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written or was removed
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; removing a missing key is not an error
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Trait for the durable queue of pending clock actions
///
/// Every mutation rewrites the whole list; there is no partial update.
#[async_trait]
pub trait ActionQueue: Send + Sync {
    /// All queued actions in storage order. A corrupt blob reads as empty.
    async fn get_all(&self) -> Result<Vec<OfflineClockAction>>;

    /// Add one action to the end of the queue
    async fn append(&self, action: &OfflineClockAction) -> Result<()>;

    /// Remove the action with this id; silently does nothing if absent
    async fn remove_by_id(&self, id: &str) -> Result<()>;

    /// Increment the retry count and overwrite the last error.
    ///
    /// Returns the new retry count, or `None` if no action has this id.
    async fn update_retry(&self, id: &str, error: Option<&str>) -> Result<Option<u32>>;

    /// Push an action straight to the retry ceiling so it is never retried.
    ///
    /// Returns the new retry count, or `None` if no action has this id.
    async fn mark_exhausted(&self, id: &str, error: Option<&str>) -> Result<Option<u32>>;

    /// Drop actions past the retention window; returns how many were removed
    async fn cleanup_expired(&self) -> Result<usize>;

    /// Number of queued actions
    async fn count(&self) -> Result<usize>;

    /// Remove the whole queue blob
    async fn clear(&self) -> Result<()>;

    /// Actions at or above the retry ceiling
    async fn get_failed(&self) -> Result<Vec<OfflineClockAction>>;

    /// Record "now" as the last sync attempt
    async fn save_last_sync_timestamp(&self) -> Result<()>;

    /// Time of the last recorded sync attempt
    async fn get_last_sync_timestamp(&self) -> Result<Option<DateTime<Utc>>>;
}

/// Remote attendance submission endpoints
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Submit a clock action body to the endpoint for `action_type`.
    async fn submit(
        &self,
        action_type: ClockActionType,
        payload: &serde_json::Value,
    ) -> std::result::Result<(), SubmissionError>;
}

/// Device connectivity signal
pub trait ConnectivityMonitor: Send + Sync {
    /// Current connectivity
    fn is_connected(&self) -> bool;

    /// Receiver notified on every connected/disconnected change
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Source of the device block embedded in clock payloads
pub trait DeviceInfoProvider: Send + Sync {
    fn device_info(&self) -> DeviceInfo;
}

/// Device metadata resolved once at startup.
#[derive(Debug, Clone)]
pub struct StaticDeviceInfo(pub DeviceInfo);

impl DeviceInfoProvider for StaticDeviceInfo {
    fn device_info(&self) -> DeviceInfo {
        self.0.clone()
    }
}

/// Anomalies that are recovered from locally but should not vanish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// The queue blob could not be parsed and was treated as empty
    CorruptQueue {
        key: String,
        error: String,
        length: usize,
    },
    /// The stored last-sync timestamp could not be parsed
    CorruptTimestamp { key: String, value: String },
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptQueue { key, error, length } => {
                write!(f, "corrupt queue blob under {key} ({length} bytes): {error}")
            }
            Self::CorruptTimestamp { key, value } => {
                write!(f, "corrupt timestamp under {key}: {value:?}")
            }
        }
    }
}

/// Receiver of [`DiagnosticEvent`]s
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, event: DiagnosticEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn report(&self, _event: DiagnosticEvent) {}
}
