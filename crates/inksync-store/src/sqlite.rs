//! SQLite implementation of the Store trait.
//!
//! This is the primary ledger backend on both server and client. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use inksync_core::{ContentHash, Update};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file (and its parent directory) and runs migrations if
    /// it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened ledger");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::InvalidData(format!("connection mutex poisoned: {e}")))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::TaskJoin(e.to_string()))?
    }
}

// Helper to convert a row to Update
fn row_to_update(row: &rusqlite::Row<'_>) -> rusqlite::Result<Update> {
    let hash: String = row.get("hash")?;
    let hash = ContentHash::parse(&hash).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Update {
        filepath: row.get("filepath")?,
        hash,
        time: row.get("time")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn update_record(&self, filepath: &str, hash: &ContentHash, time: i64) -> Result<()> {
        let filepath = filepath.to_string();
        let hash = hash.to_string();

        self.blocking(move |conn| {
            // An older time leaves the row untouched, which surfaces as 0 changes.
            let changed = conn.execute(
                "INSERT INTO ledger (filepath, hash, time) VALUES (?1, ?2, ?3)
                 ON CONFLICT(filepath) DO UPDATE
                 SET hash = excluded.hash, time = excluded.time
                 WHERE excluded.time >= ledger.time",
                params![filepath, hash, time],
            )?;

            if changed != 1 {
                tracing::error!(%filepath, changed, "ledger upsert did not change exactly one row");
                return Err(StoreError::RowCount { filepath, changed });
            }
            Ok(())
        })
        .await
    }

    async fn get_record(&self, filepath: &str) -> Result<Option<Update>> {
        let filepath = filepath.to_string();

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT filepath, hash, time FROM ledger WHERE filepath = ?1",
                params![filepath],
                row_to_update,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_records_newer_than(&self, timestamp: i64) -> Result<Vec<Update>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT filepath, hash, time FROM ledger WHERE time > ?1 ORDER BY time, filepath",
            )?;

            let updates = stmt
                .query_map(params![timestamp], row_to_update)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(updates)
        })
        .await
    }

    async fn get_all_records(&self) -> Result<Vec<Update>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT filepath, hash, time FROM ledger ORDER BY filepath")?;

            let updates = stmt
                .query_map([], row_to_update)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(updates)
        })
        .await
    }

    async fn set_last_pull(&self, time: i64) -> Result<()> {
        self.blocking(move |conn| {
            conn.execute(
                "UPDATE last_pull SET time = MAX(time, ?1) WHERE id = 0",
                params![time],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_last_pull(&self) -> Result<i64> {
        self.blocking(|conn| {
            conn.query_row("SELECT time FROM last_pull WHERE id = 0", [], |row| row.get(0))
                .map_err(StoreError::from)
        })
        .await
    }
}
