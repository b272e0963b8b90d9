//! In-process adapter over a [`Vault`] in the same address space.

use std::sync::Arc;

use async_trait::async_trait;
use inksync_core::{ContentHash, FileState, PushReceipt, Update, Upload};
use inksync_vault::Vault;

use crate::api::VaultApi;
use crate::error::Result;
use crate::wire::PONG;

/// Talks to a local [`Vault`] directly, for embedded and same-host use.
#[derive(Debug, Clone)]
pub struct LocalVaultApi {
    vault: Arc<Vault>,
}

impl LocalVaultApi {
    pub fn new(vault: Arc<Vault>) -> Self {
        Self { vault }
    }

    pub fn vault(&self) -> &Arc<Vault> {
        &self.vault
    }
}

#[async_trait]
impl VaultApi for LocalVaultApi {
    async fn ping(&self) -> Result<String> {
        Ok(PONG.to_string())
    }

    async fn updates_since(&self, time: i64) -> Result<Vec<Update>> {
        Ok(self.vault.get_updates_since(time).await?)
    }

    async fn upload_file(
        &self,
        filepath: &str,
        current_hash: Option<&ContentHash>,
        upload: Upload,
    ) -> Result<PushReceipt> {
        Ok(self.vault.push_update(upload, filepath, current_hash).await?)
    }

    async fn get_file(&self, filepath: &str) -> Result<FileState> {
        Ok(self.vault.get_current(filepath).await?)
    }

    async fn get_update(&self, filepath: &str) -> Result<Option<Update>> {
        Ok(self.vault.get_update_for(filepath).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use bytes::Bytes;
    use inksync_store::{MemoryFilesystem, MemoryStore};

    fn api() -> LocalVaultApi {
        LocalVaultApi::new(Arc::new(Vault::new(
            "local",
            MemoryStore::new(),
            MemoryFilesystem::new(),
        )))
    }

    #[tokio::test]
    async fn test_roundtrip_through_adapter() {
        let api = api();
        assert_eq!(api.ping().await.unwrap(), "pong");
        assert_eq!(api.get_update("a.txt").await.unwrap(), None);

        let receipt = api
            .upload_file("a.txt", None, Upload::Content(Bytes::from_static(b"hello")))
            .await
            .unwrap();
        assert_eq!(
            api.get_file("a.txt").await.unwrap(),
            FileState::Content(Bytes::from_static(b"hello"))
        );
        let update = api.get_update("a.txt").await.unwrap().unwrap();
        assert_eq!(update.time, receipt.time);
        assert_eq!(api.updates_since(0).await.unwrap(), vec![update]);
    }

    #[tokio::test]
    async fn test_stale_base_surfaces_as_sync_error() {
        let api = api();
        api.upload_file("a.txt", None, Upload::Delete).await.unwrap();
        let err = api
            .upload_file("a.txt", None, Upload::Content(Bytes::from_static(b"x")))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::StaleBase { .. }));
    }
}
