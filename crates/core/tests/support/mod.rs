//! Shared test helpers for `timeclock-core` integration tests.
//!
//! In-memory fakes of the storage, API and connectivity ports so sync tests
//! can assert on call order and queue contents without any I/O.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use timeclock_core::{
    AttendanceApi, ConnectivityMonitor, KeyValueStore, MockClock, OfflineActionService,
    OfflineQueueStore, SyncCoordinator, SyncEngine, SyncPolicy,
};
use timeclock_domain::{ClockActionType, OfflineClockAction, Result, SubmissionError};
use tokio::sync::{watch, Notify};

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

pub fn action(action_type: ClockActionType, created_at: DateTime<Utc>) -> OfflineClockAction {
    let field = action_type.timestamp_field();
    OfflineClockAction::new(action_type, json!({ field: created_at.to_rfc3339() }), created_at)
}

#[derive(Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn put_raw(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// Records every submission in call order and answers from a script.
///
/// When gated, each call blocks until [`RecordingApi::open_gate`].
pub struct RecordingApi {
    script: Mutex<VecDeque<std::result::Result<(), SubmissionError>>>,
    calls: Mutex<Vec<(ClockActionType, Value)>>,
    gate: watch::Sender<bool>,
    called: Notify,
}

impl Default for RecordingApi {
    fn default() -> Self {
        Self {
            script: Mutex::default(),
            calls: Mutex::default(),
            gate: watch::Sender::new(true),
            called: Notify::new(),
        }
    }
}

impl RecordingApi {
    pub fn scripted(
        script: impl IntoIterator<Item = std::result::Result<(), SubmissionError>>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn gated() -> Self {
        let api = Self::default();
        api.gate.send_replace(false);
        api
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    /// Resolves once at least one submission has started.
    pub async fn first_call(&self) {
        self.called.notified().await;
    }

    pub fn calls(&self) -> Vec<(ClockActionType, Value)> {
        self.calls.lock().clone()
    }

    pub fn call_types(&self) -> Vec<ClockActionType> {
        self.calls.lock().iter().map(|(action_type, _)| *action_type).collect()
    }
}

#[async_trait]
impl AttendanceApi for RecordingApi {
    async fn submit(
        &self,
        action_type: ClockActionType,
        payload: &Value,
    ) -> std::result::Result<(), SubmissionError> {
        self.calls.lock().push((action_type, payload.clone()));
        self.called.notify_one();

        let mut gate = self.gate.subscribe();
        if gate.wait_for(|open| *open).await.is_err() {
            return Err(SubmissionError::network("gate dropped"));
        }

        self.script.lock().pop_front().unwrap_or(Ok(()))
    }
}

pub struct SwitchableConnectivity {
    tx: watch::Sender<bool>,
}

impl SwitchableConnectivity {
    pub fn new(connected: bool) -> Self {
        Self { tx: watch::Sender::new(connected) }
    }

    pub fn set(&self, connected: bool) {
        self.tx.send_replace(connected);
    }
}

impl ConnectivityMonitor for SwitchableConnectivity {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Fully wired core stack over in-memory fakes.
pub struct Harness {
    pub kv: Arc<MemoryKeyValueStore>,
    pub clock: Arc<MockClock>,
    pub queue: Arc<OfflineQueueStore>,
    pub api: Arc<RecordingApi>,
    pub connectivity: Arc<SwitchableConnectivity>,
    pub engine: Arc<SyncEngine>,
    pub coordinator: Arc<SyncCoordinator>,
    pub service: OfflineActionService,
}

impl Harness {
    pub fn new(api: RecordingApi) -> Self {
        Self::with_policy(api, SyncPolicy::without_delay())
    }

    pub fn with_policy(api: RecordingApi, policy: SyncPolicy) -> Self {
        let kv = Arc::new(MemoryKeyValueStore::default());
        let clock = Arc::new(MockClock::new(at(18, 0)));
        let queue = Arc::new(OfflineQueueStore::new(kv.clone()).with_clock(clock.clone()));
        let api = Arc::new(api);
        let connectivity = Arc::new(SwitchableConnectivity::new(true));
        let engine = Arc::new(SyncEngine::new(queue.clone(), api.clone(), policy));
        let coordinator =
            Arc::new(SyncCoordinator::new(engine.clone(), queue.clone(), connectivity.clone()));
        let service = OfflineActionService::new(queue.clone(), engine.clone(), clock.clone());

        Self { kv, clock, queue, api, connectivity, engine, coordinator, service }
    }
}
