//! Domain types and models

pub mod action;
pub mod payload;
pub mod sync;

pub use action::{ClockActionType, OfflineClockAction};
pub use payload::{ActionTimestamp, ClockPayload, Coordinates, DeviceInfo, GeoLocation};
pub use sync::{SyncResult, SyncStatus};
