//! SQLite-backed implementation of the key-value storage port.
//!
//! A single `kv_store` table holds string values by key, mirroring the
//! device key-value storage the offline queue was designed around. All
//! statements run on the blocking pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use timeclock_core::KeyValueStore;
use timeclock_domain::{Result as DomainResult, TimeclockError};
use tokio::task;
use tracing::{debug, info};

use crate::errors::InfraError;

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)";

const GET_SQL: &str = "SELECT value FROM kv_store WHERE key = ?1";
const UPSERT_SQL: &str = "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";
const DELETE_SQL: &str = "DELETE FROM kv_store WHERE key = ?1";

/// Durable key-value store on a single SQLite connection.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(InfraError::from)?;
        }

        let conn = Connection::open(path).map_err(InfraError::from)?;
        info!(path = %path.display(), "Opened key-value store");
        Self::init(conn)
    }

    /// In-memory database, lost when the store is dropped.
    pub fn open_in_memory() -> DomainResult<Self> {
        let conn = Connection::open_in_memory().map_err(InfraError::from)?;
        Self::init(conn)
    }

    /// Open from a configured path; `:memory:` selects an in-memory database.
    pub fn from_config_path(path: &str) -> DomainResult<Self> {
        if path == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(path)
        }
    }

    fn init(conn: Connection) -> DomainResult<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5)).map_err(InfraError::from)?;
        let journal_mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(InfraError::from)?;
        debug!(journal_mode = %journal_mode, "Key-value store ready");
        conn.execute(SCHEMA_SQL, []).map_err(InfraError::from)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DomainResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let guard = conn.lock();
            op(&guard)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get_item(&self, key: &str) -> DomainResult<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.query_row(GET_SQL, params![key], |row| row.get::<_, String>(0))
                .optional()
                .map_err(map_sql_error)
        })
        .await
    }

    async fn set_item(&self, key: &str, value: &str) -> DomainResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            conn.execute(UPSERT_SQL, params![key, value]).map_err(map_sql_error)?;
            debug!(key = %key, bytes = value.len(), "Stored value");
            Ok(())
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> DomainResult<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute(DELETE_SQL, params![key]).map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }
}

fn map_sql_error(err: rusqlite::Error) -> TimeclockError {
    InfraError::from(err).into()
}

fn map_join_error(err: task::JoinError) -> TimeclockError {
    InfraError::from(err).into()
}
