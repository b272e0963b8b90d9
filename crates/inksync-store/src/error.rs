//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during ledger or filesystem operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A ledger upsert changed a row count other than one.
    ///
    /// The storage contract itself is broken; callers must not continue.
    #[error("ledger write for {filepath:?} changed {changed} rows, expected exactly 1")]
    RowCount { filepath: String, changed: usize },

    /// File not found on the filesystem.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Path rejected by the filesystem sandbox.
    #[error(transparent)]
    InvalidPath(#[from] inksync_core::CoreError),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    TaskJoin(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Errors that mean the ledger can no longer be trusted.
    ///
    /// SQLite failures count, except a busy or locked database, which a
    /// later attempt may get past.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::RowCount { .. } | Self::Migration(_) | Self::InvalidData(_) => true,
            Self::Database(rusqlite::Error::SqliteFailure(err, _)) => !matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            Self::Database(_) => true,
            _ => false,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
