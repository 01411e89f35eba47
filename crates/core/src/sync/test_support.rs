//! In-memory fakes shared by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use timeclock_domain::{ClockActionType, Result, SubmissionError, TimeclockError};
use tokio::sync::watch;

use super::ports::{
    AttendanceApi, ConnectivityMonitor, DiagnosticEvent, DiagnosticsSink, KeyValueStore,
};

#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, value: &str) {
        self.items.lock().insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().get(key).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TimeclockError::Storage("read failed".into()));
        }
        Ok(self.raw(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TimeclockError::Storage("write failed".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(key, value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TimeclockError::Storage("write failed".into()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.items.lock().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

/// API fake that answers from a script and records every call.
///
/// Once the script runs out every call succeeds.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<VecDeque<std::result::Result<(), SubmissionError>>>,
    calls: Mutex<Vec<(ClockActionType, Value)>>,
}

impl ScriptedApi {
    pub fn with_script(
        script: impl IntoIterator<Item = std::result::Result<(), SubmissionError>>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<(ClockActionType, Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AttendanceApi for ScriptedApi {
    async fn submit(
        &self,
        action_type: ClockActionType,
        payload: &Value,
    ) -> std::result::Result<(), SubmissionError> {
        self.calls.lock().push((action_type, payload.clone()));
        self.script.lock().pop_front().unwrap_or(Ok(()))
    }
}

pub struct FakeConnectivity {
    tx: watch::Sender<bool>,
}

impl FakeConnectivity {
    pub fn new(connected: bool) -> Self {
        Self {
            tx: watch::Sender::new(connected),
        }
    }

    pub fn set(&self, connected: bool) {
        self.tx.send_replace(connected);
    }
}

impl ConnectivityMonitor for FakeConnectivity {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
