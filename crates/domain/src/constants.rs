//! Sync policy constants
//!
//! Fixed policy for the offline clock-action queue. These are not read from
//! configuration; the sync engine takes them through `SyncPolicy::default()`.

/// Failed sync attempts after which an action is considered permanently
/// failed and is skipped by every later pass.
pub const MAX_RETRY_COUNT: u32 = 5;

/// Queued actions older than this are dropped by retention cleanup.
pub const DATA_RETENTION_DAYS: i64 = 7;

/// Pause after a failed submission before the next action is attempted.
pub const RETRY_DELAY_MS: u64 = 1_000;

// Storage keys
pub const OFFLINE_ACTIONS_KEY: &str = "@offline_clock_actions";
pub const LAST_SYNC_ATTEMPT_KEY: &str = "@last_sync_attempt";

/// Fallback when a failure carries no usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";
