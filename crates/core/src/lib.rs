//! # Timeclock Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for storage, the attendance API,
//!   connectivity, time and device metadata
//! - The durable offline queue, action factory and sync engine
//! - The single-flight sync coordinator and its connectivity watcher
//! - The clock-in/clock-out service used by the UI layer
//!
//! ## Architecture Principles
//! - Only depends on `timeclock-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod attendance;
pub mod sync;
pub mod time;

pub use attendance::{AttendanceService, ClockOutcome};
pub use sync::ports::{
    ActionQueue, AttendanceApi, ConnectivityMonitor, DeviceInfoProvider, DiagnosticEvent,
    DiagnosticsSink, KeyValueStore, NoopDiagnostics, StaticDeviceInfo,
};
pub use sync::{
    ActionFactory, ClockEvent, ConnectivityWatcher, CoordinatorSnapshot, CoordinatorState,
    OfflineActionService, OfflineQueueStore, SyncCoordinator, SyncEngine, SyncPolicy,
    SyncTrigger, WatcherConfig,
};
pub use time::{Clock, MockClock, SystemClock};
