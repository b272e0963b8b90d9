//! The Vault: the authoritative ledger and content for one synced directory.
//!
//! Per-file state machine, driven only by [`Vault::push_update`]:
//!
//! ```text
//! Untracked ──push──▶ Tracked(hash, t) ──push DELETE──▶ Tombstoned(DELETED, t')
//!                          ▲                                   │
//!                          └──────────────push─────────────────┘
//! ```
//!
//! There are no locks visible to callers. Every write is a compare-and-swap
//! on the hash the caller last saw; losers get [`VaultError::StaleBase`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use inksync_core::{
    is_meta_path, now_millis, validate_path, ContentHash, FileState, PushReceipt, Update, Upload,
    META_DIR,
};
use inksync_store::{Filesystem, LocalFilesystem, SqliteStore, Store, StoreError};

use crate::error::{Result, VaultError};

/// Ledger file name used by [`Vault::open`] inside the metadata directory.
pub const VAULT_LEDGER: &str = "vault.db";

/// Prune dead per-file lock entries once the map grows past this size.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Server-side authority combining one ledger and one file tree under a
/// stable name.
pub struct Vault {
    name: String,
    store: Arc<dyn Store>,
    fs: Arc<dyn Filesystem>,
    /// Serializes the read-compare-write of a single filepath.
    locks: Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>,
}

impl Vault {
    /// Create a vault over an existing ledger and filesystem.
    pub fn new(
        name: impl Into<String>,
        store: impl Store + 'static,
        fs: impl Filesystem + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            store: Arc::new(store),
            fs: Arc::new(fs),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Open a vault over a directory on disk.
    ///
    /// The ledger defaults to `<root>/.inksync/vault.db`.
    pub fn open(name: impl Into<String>, root: &Path, ledger: Option<PathBuf>) -> Result<Self> {
        let ledger = ledger.unwrap_or_else(|| root.join(META_DIR).join(VAULT_LEDGER));
        std::fs::create_dir_all(root).map_err(StoreError::from)?;
        let store = SqliteStore::open(&ledger)?;
        let name = name.into();
        tracing::info!(vault = %name, root = %root.display(), ledger = %ledger.display(), "opened vault");
        Ok(Self::new(name, store, LocalFilesystem::new(root)))
    }

    /// The stable external identifier used on the wire.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Compare-and-swap write of one file.
    ///
    /// Succeeds only if `current_hash` equals the hash on record (`None` for
    /// a file the vault has never tracked). On success the bytes are written
    /// (or removed, for a delete), the ledger is upserted, and the new
    /// `(time, hash)` is returned.
    pub async fn push_update(
        &self,
        upload: Upload,
        filepath: &str,
        current_hash: Option<&ContentHash>,
    ) -> Result<PushReceipt> {
        validate_path(filepath)?;
        if is_meta_path(filepath) {
            return Err(VaultError::ReservedPath(filepath.to_string()));
        }

        let lock = self.lock_for(filepath);
        let _guard = lock.lock().await;

        let record = self.store.get_record(filepath).await?;
        let on_record = record.as_ref().map(|r| r.hash);
        if on_record.as_ref() != current_hash {
            tracing::debug!(vault = %self.name, %filepath, "rejected push with stale base");
            return Err(VaultError::StaleBase {
                filepath: filepath.to_string(),
                on_record,
                provided: current_hash.copied(),
            });
        }

        let new_hash = upload.hash();
        let time = match &record {
            Some(r) => now_millis().max(r.time + 1),
            None => now_millis(),
        };

        // Content first: the ledger row is the commit point.
        match &upload {
            Upload::Content(data) => self.fs.write_to(filepath, data).await?,
            Upload::Delete => match self.fs.remove(filepath).await {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            },
        }
        self.store.update_record(filepath, &new_hash, time).await?;

        tracing::info!(
            vault = %self.name,
            %filepath,
            hash = %new_hash,
            time,
            "accepted push"
        );
        Ok(PushReceipt { time, new_hash })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// The authoritative content of a file.
    pub async fn get_current(&self, filepath: &str) -> Result<FileState> {
        validate_path(filepath)?;
        match self.store.get_record(filepath).await? {
            None => Ok(FileState::NonExistent),
            Some(record) if record.is_tombstone() => Ok(FileState::Deleted),
            Some(_) => match self.fs.read_from(filepath).await {
                Ok(data) => Ok(FileState::Content(data)),
                Err(StoreError::NotFound(_)) => {
                    tracing::error!(vault = %self.name, %filepath, "tracked file missing from tree");
                    Err(VaultError::MissingContent(filepath.to_string()))
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    /// The ledger record for a file, if it was ever tracked.
    pub async fn get_update_for(&self, filepath: &str) -> Result<Option<Update>> {
        validate_path(filepath)?;
        Ok(self.store.get_record(filepath).await?)
    }

    /// Every record written after `time` (the pull-side catch-up query).
    pub async fn get_updates_since(&self, time: i64) -> Result<Vec<Update>> {
        Ok(self.store.get_records_newer_than(time).await?)
    }

    fn lock_for(&self, filepath: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(lock) = locks.get(filepath).and_then(Weak::upgrade) {
            return lock;
        }
        if locks.len() >= LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, weak| weak.strong_count() > 0);
        }

        let lock = Arc::new(tokio::sync::Mutex::new(()));
        locks.insert(filepath.to_string(), Arc::downgrade(&lock));
        lock
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").field("name", &self.name).finish()
    }
}
