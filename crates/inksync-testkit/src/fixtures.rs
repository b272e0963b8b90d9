//! Test fixtures and helpers.
//!
//! Everything here is in memory: a [`TestVault`] wraps a [`Vault`] over a
//! [`MemoryStore`] and [`MemoryFilesystem`], and its clients reach it through
//! a [`LocalVaultApi`].

use std::sync::Arc;

use bytes::Bytes;
use inksync_core::{is_conflict_file, FileState, PushReceipt, Upload};
use inksync_store::{Filesystem, MemoryFilesystem, MemoryStore, Store, StoreError};
use inksync_sync::{ClientConfig, LocalVaultApi, VaultApi, VaultClient};
use inksync_vault::Vault;

/// A client whose ledger and tree live in memory.
pub type TestClient<A = LocalVaultApi> = VaultClient<MemoryStore, MemoryFilesystem, A>;

/// An in-memory vault with helpers for seeding server-side state.
#[derive(Debug, Clone)]
pub struct TestVault {
    pub vault: Arc<Vault>,
}

impl TestVault {
    pub fn new(name: &str) -> Self {
        Self {
            vault: Arc::new(Vault::new(name, MemoryStore::new(), MemoryFilesystem::new())),
        }
    }

    pub fn api(&self) -> LocalVaultApi {
        LocalVaultApi::new(self.vault.clone())
    }

    /// A fresh in-memory client of this vault.
    pub fn client(&self) -> TestClient {
        self.client_with(ClientConfig::default())
    }

    pub fn client_with(&self, config: ClientConfig) -> TestClient {
        memory_client(self.api(), config)
    }

    /// Write a file as a well-behaved writer would: based on the current record.
    pub async fn put(&self, path: &str, data: &[u8]) -> inksync_vault::Result<PushReceipt> {
        let current = self.vault.get_update_for(path).await?.map(|u| u.hash);
        self.vault
            .push_update(Upload::Content(Bytes::copy_from_slice(data)), path, current.as_ref())
            .await
    }

    /// Tombstone a file based on the current record.
    pub async fn delete(&self, path: &str) -> inksync_vault::Result<PushReceipt> {
        let current = self.vault.get_update_for(path).await?.map(|u| u.hash);
        self.vault
            .push_update(Upload::Delete, path, current.as_ref())
            .await
    }

    /// Current content, `None` for deleted or never-written files.
    pub async fn content(&self, path: &str) -> inksync_vault::Result<Option<Bytes>> {
        Ok(match self.vault.get_current(path).await? {
            FileState::Content(data) => Some(data),
            FileState::Deleted | FileState::NonExistent => None,
        })
    }
}

/// A vault plus several clients of it.
pub struct TestFixture {
    pub vault: TestVault,
    pub clients: Vec<TestClient>,
}

impl TestFixture {
    pub fn new(clients: usize) -> Self {
        let vault = TestVault::new("fixture");
        let clients = (0..clients).map(|_| vault.client()).collect();
        Self { vault, clients }
    }

    pub fn client(&self, index: usize) -> &TestClient {
        &self.clients[index]
    }

    /// Sync every client, in order, `rounds` times.
    pub async fn sync_round(&self, rounds: usize) -> inksync_sync::Result<()> {
        for _ in 0..rounds {
            for client in &self.clients {
                client.sync_all().await?;
            }
        }
        Ok(())
    }
}

/// Build an in-memory client over any vault API.
pub fn memory_client<A: VaultApi>(api: A, config: ClientConfig) -> TestClient<A> {
    VaultClient::new(MemoryStore::new(), MemoryFilesystem::new(), api, config)
}

pub async fn write_file<S: Store, F: Filesystem, A: VaultApi>(
    client: &VaultClient<S, F, A>,
    path: &str,
    data: &[u8],
) -> inksync_store::Result<()> {
    client.fs().write_to(path, data).await
}

/// Remove a local file, ignoring files that are already gone.
pub async fn remove_file<S: Store, F: Filesystem, A: VaultApi>(
    client: &VaultClient<S, F, A>,
    path: &str,
) -> inksync_store::Result<()> {
    match client.fs().remove(path).await {
        Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Local content, `None` if the file does not exist.
pub async fn read_file<S: Store, F: Filesystem, A: VaultApi>(
    client: &VaultClient<S, F, A>,
    path: &str,
) -> inksync_store::Result<Option<Bytes>> {
    match client.fs().read_from(path).await {
        Ok(data) => Ok(Some(data)),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Conflict artifacts present in a client's tree.
pub async fn conflict_files<S: Store, F: Filesystem, A: VaultApi>(
    client: &VaultClient<S, F, A>,
) -> inksync_store::Result<Vec<String>> {
    Ok(client
        .fs()
        .listdir("", true)
        .await?
        .into_iter()
        .filter(|p| is_conflict_file(p))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inksync_core::SyncResult;

    #[tokio::test]
    async fn test_vault_helpers_chain_hashes() {
        let vault = TestVault::new("t");
        vault.put("a.txt", b"1").await.unwrap();
        vault.put("a.txt", b"2").await.unwrap();
        assert_eq!(vault.content("a.txt").await.unwrap().as_deref(), Some(&b"2"[..]));
        vault.delete("a.txt").await.unwrap();
        assert_eq!(vault.content("a.txt").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fixture_clients_share_vault() {
        let fixture = TestFixture::new(2);
        write_file(fixture.client(0), "a.txt", b"hi").await.unwrap();
        fixture.sync_round(1).await.unwrap();

        assert_eq!(
            read_file(fixture.client(1), "a.txt").await.unwrap().as_deref(),
            Some(&b"hi"[..])
        );
        assert_eq!(fixture.client(1).sync_file("a.txt").await.unwrap(), SyncResult::InSync);
        assert!(conflict_files(fixture.client(1)).await.unwrap().is_empty());
    }
}
