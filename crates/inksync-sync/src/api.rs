//! VaultApi: the transport-neutral facade a client uses to reach a vault.
//!
//! Implementations must turn every transport failure into an `Err`. A
//! network problem is never reported as a valid domain answer (an
//! unreachable vault is not an untracked file).

use std::sync::Arc;

use async_trait::async_trait;
use inksync_core::{ContentHash, FileState, PushReceipt, Update, Upload};

use crate::error::Result;

/// Operations a [`VaultClient`](crate::VaultClient) needs from a vault.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Liveness check. Returns `"pong"`.
    async fn ping(&self) -> Result<String>;

    /// Every record written after `time`.
    async fn updates_since(&self, time: i64) -> Result<Vec<Update>>;

    /// Compare-and-swap push. `current_hash` is `None` when the caller
    /// believes the file is untracked. A lost race is
    /// [`SyncError::StaleBase`](crate::SyncError::StaleBase).
    async fn upload_file(
        &self,
        filepath: &str,
        current_hash: Option<&ContentHash>,
        upload: Upload,
    ) -> Result<PushReceipt>;

    /// The authoritative content of a file.
    async fn get_file(&self, filepath: &str) -> Result<FileState>;

    /// The vault's ledger record for a file, `None` if untracked.
    async fn get_update(&self, filepath: &str) -> Result<Option<Update>>;
}

#[async_trait]
impl<A: VaultApi + ?Sized> VaultApi for Arc<A> {
    async fn ping(&self) -> Result<String> {
        (**self).ping().await
    }

    async fn updates_since(&self, time: i64) -> Result<Vec<Update>> {
        (**self).updates_since(time).await
    }

    async fn upload_file(
        &self,
        filepath: &str,
        current_hash: Option<&ContentHash>,
        upload: Upload,
    ) -> Result<PushReceipt> {
        (**self).upload_file(filepath, current_hash, upload).await
    }

    async fn get_file(&self, filepath: &str) -> Result<FileState> {
        (**self).get_file(filepath).await
    }

    async fn get_update(&self, filepath: &str) -> Result<Option<Update>> {
        (**self).get_update(filepath).await
    }
}
