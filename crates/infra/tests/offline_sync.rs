//! Offline queue against a real SQLite file and a mock attendance server.

use std::path::Path;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use timeclock_core::{ConnectivityMonitor, SyncPolicy, SyncTrigger};
use timeclock_domain::{
    ApiConfig, ClockActionType, Config, Coordinates, DeviceConfig, LoggingConfig, StorageConfig,
    SyncResult, TimeclockError,
};
use timeclock_infra::AppContext;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OFFICE: Coordinates = Coordinates { latitude: 52.52, longitude: 13.405, accuracy: Some(8.0) };

fn config(base_url: &str, db: &Path) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            access_token: Some("test-token".into()),
        },
        storage: StorageConfig { path: db.to_string_lossy().into_owned() },
        device: DeviceConfig { model: "Pixel 8".into(), ..DeviceConfig::default() },
        logging: LoggingConfig::default(),
    }
}

async fn context(server: &MockServer, db: &Path) -> AppContext {
    AppContext::with_policy(config(&server.uri(), db), SyncPolicy::without_delay()).await.unwrap()
}

#[tokio::test]
async fn offline_clock_in_is_delivered_on_sync() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/attendance/clock-in"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let ctx = context(&server, &dir.path().join("timeclock.db")).await;

    let outcome = ctx.attendance.clock_in(OFFICE).await.unwrap();
    assert!(outcome.is_queued());
    assert_eq!(ctx.offline_actions.get_pending_count().await.unwrap(), 1);
    assert_eq!(ctx.coordinator.snapshot().pending_count, 1);

    ctx.connectivity.set_connected(true);
    let trigger = ctx.coordinator.trigger_sync().await;

    assert_eq!(trigger, SyncTrigger::Completed(SyncResult { synced: 1, failed: 0, remaining: 0 }));
    assert!(!ctx.offline_actions.has_pending_actions().await.unwrap());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("clockInTime").is_some());
    assert_eq!(body["location"], json!({ "lat": 52.52, "lng": 13.405, "accuracy": 8.0 }));
    assert_eq!(body["device"]["model"], "Pixel 8");
}

#[tokio::test]
async fn queue_and_device_id_survive_restart() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("timeclock.db");

    let (queued_id, device_id) = {
        let ctx = context(&server, &db).await;
        let queued = match ctx.attendance.clock_out(OFFICE).await.unwrap() {
            timeclock_core::ClockOutcome::Queued(action) => action,
            other => panic!("expected queued action, got {other:?}"),
        };
        let device_id = queued.payload["device"]["deviceId"].as_str().unwrap().to_string();
        (queued.id, device_id)
    };

    let ctx = context(&server, &db).await;
    let pending = ctx.offline_actions.get_pending_actions().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, queued_id);
    assert_eq!(pending[0].action_type, ClockActionType::ClockOut);

    let event = ctx.attendance.clock_in(OFFICE).await.unwrap();
    let timeclock_core::ClockOutcome::Queued(second) = event else {
        panic!("expected queued action");
    };
    assert_eq!(second.payload["device"]["deviceId"], device_id.as_str());
}

#[tokio::test]
async fn server_failure_is_recorded_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(json!({ "error": { "message": "maintenance" } })),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db = dir.path().join("timeclock.db");
    {
        let ctx = context(&server, &db).await;
        ctx.attendance.clock_in(OFFICE).await.unwrap();
        ctx.connectivity.set_connected(true);

        let trigger = ctx.coordinator.trigger_sync().await;
        assert_eq!(
            trigger,
            SyncTrigger::Completed(SyncResult { synced: 0, failed: 0, remaining: 1 })
        );
    }

    let ctx = context(&server, &db).await;
    let pending = ctx.offline_actions.get_pending_actions().await.unwrap();
    assert_eq!(pending[0].retry_count, 1);
    assert_eq!(pending[0].last_error.as_deref(), Some("maintenance"));
    assert!(ctx.offline_actions.get_last_sync_attempt().await.unwrap().is_some());
}

#[tokio::test]
async fn online_rejection_is_not_queued() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "message": "Already clocked in today" })),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let ctx = context(&server, &dir.path().join("timeclock.db")).await;
    ctx.connectivity.set_connected(true);

    let err = ctx.attendance.clock_in(OFFICE).await.unwrap_err();

    match err {
        TimeclockError::Submission(submission) => {
            assert_eq!(submission.user_message(), "Already clocked in today");
        }
        other => panic!("expected submission error, got {other:?}"),
    }
    assert_eq!(ctx.offline_actions.get_pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn unreachable_server_queues_the_same_payload() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let dir = TempDir::new().unwrap();
    let ctx = AppContext::with_policy(
        config(&base_url, &dir.path().join("timeclock.db")),
        SyncPolicy::without_delay(),
    )
    .await
    .unwrap();
    ctx.connectivity.set_connected(true);

    let outcome = ctx.attendance.clock_in(OFFICE).await.unwrap();

    assert!(outcome.is_queued());
    assert_eq!(ctx.offline_actions.get_pending_count().await.unwrap(), 1);
}

#[tokio::test]
async fn reconnect_triggers_background_sync() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let ctx = context(&server, &dir.path().join("timeclock.db")).await;
    ctx.attendance.clock_in(OFFICE).await.unwrap();
    ctx.attendance.clock_out(OFFICE).await.unwrap();
    assert!(!ctx.connectivity.is_connected());

    ctx.start().await.unwrap();
    let mut updates = ctx.coordinator.subscribe();
    ctx.connectivity.set_connected(true);

    tokio::time::timeout(
        Duration::from_secs(5),
        updates.wait_for(|snapshot| snapshot.last_result.is_some() && snapshot.pending_count == 0),
    )
    .await
    .expect("sync did not finish")
    .unwrap();

    ctx.shutdown().await.unwrap();
    assert!(!ctx.is_running().await);
    assert_eq!(ctx.offline_actions.get_pending_count().await.unwrap(), 0);
}
