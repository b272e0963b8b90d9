//! Store trait: the abstract interface for a replica's change ledger.
//!
//! The same ledger shape is used on both sides of a sync: the vault keeps
//! the authoritative one, each client keeps its last-known copy.

use std::sync::Arc;

use async_trait::async_trait;
use inksync_core::{ContentHash, Update};

use crate::error::Result;

/// The Store trait: durable `filepath -> (hash, time)` plus a pull watermark.
///
/// # Design Notes
///
/// - **Upsert by primary key**: `update_record` must change exactly one row.
///   Any other count is reported as [`StoreError::RowCount`](crate::StoreError::RowCount).
/// - **Monotonic time**: a write whose time is older than the recorded one
///   changes no rows, and is therefore reported the same way.
/// - **Tombstones**: deletions are records whose hash is `DELETED`; rows are
///   never removed.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Record Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace the record for `filepath`.
    async fn update_record(&self, filepath: &str, hash: &ContentHash, time: i64) -> Result<()>;

    /// Get the record for a filepath, if it was ever tracked.
    async fn get_record(&self, filepath: &str) -> Result<Option<Update>>;

    /// Records with `time > timestamp`, ordered by time.
    async fn get_records_newer_than(&self, timestamp: i64) -> Result<Vec<Update>>;

    /// Every record, ordered by filepath.
    async fn get_all_records(&self) -> Result<Vec<Update>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Watermark
    // ─────────────────────────────────────────────────────────────────────────

    /// Advance the last-full-pull watermark. Never moves it backwards.
    async fn set_last_pull(&self, time: i64) -> Result<()>;

    /// The last-full-pull watermark, `0` if no pull has completed.
    async fn get_last_pull(&self) -> Result<i64>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn update_record(&self, filepath: &str, hash: &ContentHash, time: i64) -> Result<()> {
        (**self).update_record(filepath, hash, time).await
    }

    async fn get_record(&self, filepath: &str) -> Result<Option<Update>> {
        (**self).get_record(filepath).await
    }

    async fn get_records_newer_than(&self, timestamp: i64) -> Result<Vec<Update>> {
        (**self).get_records_newer_than(timestamp).await
    }

    async fn get_all_records(&self) -> Result<Vec<Update>> {
        (**self).get_all_records().await
    }

    async fn set_last_pull(&self, time: i64) -> Result<()> {
        (**self).set_last_pull(time).await
    }

    async fn get_last_pull(&self) -> Result<i64> {
        (**self).get_last_pull().await
    }
}
