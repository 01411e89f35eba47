//! Queued clock actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which attendance endpoint an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockActionType {
    #[serde(rename = "clock-in")]
    ClockIn,
    #[serde(rename = "clock-out")]
    ClockOut,
}

crate::impl_domain_status_conversions!(ClockActionType {
    ClockIn => "clock-in",
    ClockOut => "clock-out",
});

impl ClockActionType {
    /// Payload field carrying the moment the user acted.
    ///
    /// The two endpoints name this field differently and the backend relies
    /// on it, so the asymmetry is kept.
    pub const fn timestamp_field(self) -> &'static str {
        match self {
            Self::ClockIn => "clockInTime",
            Self::ClockOut => "clockOutTime",
        }
    }
}

/// A clock-in/clock-out event waiting to reach the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineClockAction {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ClockActionType,
    /// Exact request body to submit.
    pub payload: serde_json::Value,
    /// Event time; drives ordering and retention. Never changes on retry.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl OfflineClockAction {
    /// Create a fresh record with a client-generated id.
    pub fn new(
        action_type: ClockActionType,
        payload: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            action_type,
            payload,
            created_at,
            retry_count: 0,
            last_error: None,
        }
    }

    /// True once the retry ceiling has been reached.
    pub fn is_exhausted(&self, max_retries: u32) -> bool {
        self.retry_count >= max_retries
    }

    /// Whether the action is older than `retention` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, retention: chrono::Duration) -> bool {
        now.signed_duration_since(self.created_at) > retention
    }
}
