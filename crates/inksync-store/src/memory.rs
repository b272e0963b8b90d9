//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use inksync_core::{ContentHash, Update};

use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records keyed by filepath.
    records: BTreeMap<String, (ContentHash, i64)>,

    /// Last full pull watermark.
    last_pull: i64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn update_record(&self, filepath: &str, hash: &ContentHash, time: i64) -> Result<()> {
        let mut inner = self.write()?;

        if let Some((_, existing)) = inner.records.get(filepath) {
            if *existing > time {
                return Err(StoreError::RowCount {
                    filepath: filepath.to_string(),
                    changed: 0,
                });
            }
        }

        inner.records.insert(filepath.to_string(), (*hash, time));
        Ok(())
    }

    async fn get_record(&self, filepath: &str) -> Result<Option<Update>> {
        let inner = self.read()?;
        Ok(inner
            .records
            .get(filepath)
            .map(|(hash, time)| Update::new(filepath, *hash, *time)))
    }

    async fn get_records_newer_than(&self, timestamp: i64) -> Result<Vec<Update>> {
        let inner = self.read()?;

        let mut updates: Vec<Update> = inner
            .records
            .iter()
            .filter(|(_, (_, time))| *time > timestamp)
            .map(|(path, (hash, time))| Update::new(path.clone(), *hash, *time))
            .collect();

        updates.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.filepath.cmp(&b.filepath)));
        Ok(updates)
    }

    async fn get_all_records(&self) -> Result<Vec<Update>> {
        let inner = self.read()?;
        Ok(inner
            .records
            .iter()
            .map(|(path, (hash, time))| Update::new(path.clone(), *hash, *time))
            .collect())
    }

    async fn set_last_pull(&self, time: i64) -> Result<()> {
        let mut inner = self.write()?;
        inner.last_pull = inner.last_pull.max(time);
        Ok(())
    }

    async fn get_last_pull(&self) -> Result<i64> {
        Ok(self.read()?.last_pull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_upsert() {
        let store = MemoryStore::new();
        let h1 = ContentHash::of(b"one");
        let h2 = ContentHash::of(b"two");

        store.update_record("a.txt", &h1, 10).await.unwrap();
        store.update_record("a.txt", &h2, 20).await.unwrap();

        let record = store.get_record("a.txt").await.unwrap().unwrap();
        assert_eq!(record.hash, h2);
        assert_eq!(record.time, 20);
        assert_eq!(store.get_all_records().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_time_regression() {
        let store = MemoryStore::new();
        let hash = ContentHash::of(b"x");
        store.update_record("a.txt", &hash, 20).await.unwrap();

        let err = store.update_record("a.txt", &hash, 10).await.unwrap_err();
        assert!(matches!(err, StoreError::RowCount { changed: 0, .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_memory_store_newer_than() {
        let store = MemoryStore::new();
        store.update_record("b", &ContentHash::Deleted, 30).await.unwrap();
        store.update_record("a", &ContentHash::of(b"a"), 10).await.unwrap();
        store.update_record("c", &ContentHash::of(b"c"), 20).await.unwrap();

        let newer = store.get_records_newer_than(10).await.unwrap();
        let paths: Vec<_> = newer.iter().map(|u| u.filepath.as_str()).collect();
        assert_eq!(paths, vec!["c", "b"]);
        assert!(newer[1].is_tombstone());
    }

    #[tokio::test]
    async fn test_memory_store_watermark_monotonic() {
        let store = MemoryStore::new();
        assert_eq!(store.get_last_pull().await.unwrap(), 0);
        store.set_last_pull(50).await.unwrap();
        store.set_last_pull(40).await.unwrap();
        assert_eq!(store.get_last_pull().await.unwrap(), 50);
    }
}
