//! Offline clock-action queue and sync
//!
//! - [`OfflineQueueStore`]: durable queue on top of a [`KeyValueStore`]
//! - [`ActionFactory`]: builds clock payloads from a location reading
//! - [`SyncEngine`]: one ordered pass over the queue
//! - [`SyncCoordinator`]: single-flight trigger and observable state
//! - [`ConnectivityWatcher`]: syncs on reconnect
//! - [`OfflineActionService`]: the queue facade the UI talks to
//!
//! [`KeyValueStore`]: ports::KeyValueStore

pub mod action_factory;
pub mod coordinator;
pub mod engine;
pub mod ports;
pub mod queue_store;
pub mod service;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_support;

pub use action_factory::{ActionFactory, ClockEvent};
pub use coordinator::{CoordinatorSnapshot, CoordinatorState, SyncCoordinator, SyncTrigger};
pub use engine::{SyncEngine, SyncPolicy};
pub use queue_store::OfflineQueueStore;
pub use service::OfflineActionService;
pub use watcher::{ConnectivityWatcher, WatcherConfig};
