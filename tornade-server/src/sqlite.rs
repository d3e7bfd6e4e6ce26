//! SQLite-backed activation store.
//!
//! Records are stored as JSON arrays in a single `activations` table keyed by
//! the namespaced record key. Blocking SQLite calls run on the blocking pool.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tornade_license::{ActivationRecord, ActivationStore, LicenseError, LicenseResult};

/// Persistent store for activation records backed by SQLite.
#[derive(Clone)]
pub struct SqliteActivationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteActivationStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| unavailable(format!("failed to open activation store: {e}")))?;
        Self::init(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> LicenseResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| unavailable(format!("failed to open in-memory activation store: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> LicenseResult<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS activations (
                record_key TEXT PRIMARY KEY,
                devices TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            ",
        )
        .map_err(|e| unavailable(format!("failed to initialize schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: F) -> LicenseResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> LicenseResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            op(&conn)
        })
        .await
        .map_err(|e| unavailable(format!("store task failed: {e}")))?
    }
}

fn unavailable(msg: String) -> LicenseError {
    LicenseError::StoreUnavailable(msg)
}

#[async_trait]
impl ActivationStore for SqliteActivationStore {
    async fn get(&self, key: &str) -> LicenseResult<Option<ActivationRecord>> {
        let key = key.to_string();
        let json: Option<String> = self
            .run(move |conn| {
                conn.query_row(
                    "SELECT devices FROM activations WHERE record_key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| unavailable(format!("read failed: {e}")))
            })
            .await?;
        json.as_deref().map(ActivationRecord::from_json).transpose()
    }

    async fn set(&self, key: &str, record: &ActivationRecord) -> LicenseResult<()> {
        let key = key.to_string();
        let json = record.to_json()?;
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO activations (record_key, devices) VALUES (?1, ?2)
                 ON CONFLICT(record_key) DO UPDATE SET
                    devices = excluded.devices,
                    updated_at = CURRENT_TIMESTAMP",
                params![key, json],
            )
            .map(|_| ())
            .map_err(|e| unavailable(format!("write failed: {e}")))
        })
        .await
    }
}
