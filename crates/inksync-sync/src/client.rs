//! VaultClient: the per-file reconciliation algorithm and whole-tree sync.
//!
//! Each file is decided independently from three observations:
//!
//! ```text
//!   live bytes ──hash──▶ isModified ◀── local ledger record
//!                             │                 │
//!                             ▼                 ▼
//!                         decide(syncStatus(local, remote), isModified)
//!                             │
//!        bad-sync │ conflict │ push │ pull │ in-sync
//! ```
//!
//! A whole-tree sync is a pull pass over remote updates newer than the
//! watermark, followed by a push pass over locally modified files. A failure
//! on one file becomes that file's [`SyncResult`] and never aborts the others.

use std::collections::{BTreeSet, HashSet};
use std::future::Future;

use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use inksync_core::{
    conflict_path, decide, is_modified, now_millis, sync_status, validate_path, ContentHash,
    FileState, IgnoreRules, SyncAction, SyncResult, SyncStatus, Update, Upload,
};
use inksync_store::{Filesystem, Store, StoreError};

use crate::api::VaultApi;
use crate::config::ClientConfig;
use crate::error::{Result, SyncError};
use crate::report::SyncReport;

/// Dry-run view of one file: what a sync would see, without acting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub filepath: String,
    pub status: SyncStatus,
    pub modified: bool,
    pub client: Option<Update>,
    pub server: Option<Update>,
}

impl FileStatus {
    /// The action a sync would take.
    pub fn action(&self) -> SyncAction {
        decide(self.status, self.modified)
    }
}

/// The live state of a local file.
struct LiveFile {
    data: Option<Bytes>,
    hash: ContentHash,
}

/// Reconciles one local root (its own ledger and filesystem) against a vault.
///
/// The client owns its ledger and filesystem exclusively; running two
/// clients over the same root is not supported.
pub struct VaultClient<S: Store, F: Filesystem, A: VaultApi> {
    store: S,
    fs: F,
    api: A,
    config: ClientConfig,
}

impl<S: Store, F: Filesystem, A: VaultApi> VaultClient<S, F, A> {
    pub fn new(store: S, fs: F, api: A, config: ClientConfig) -> Self {
        Self {
            store,
            fs,
            api,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn ping(&self) -> Result<String> {
        self.remote("ping", self.api.ping()).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Single file
    // ─────────────────────────────────────────────────────────────────────────

    /// Sync one file, deriving both ledger records itself.
    ///
    /// Per-file failures are returned as `client-error` / `server-error`
    /// results. Only a broken local ledger is an `Err`.
    pub async fn sync_file(&self, filepath: &str) -> Result<SyncResult> {
        self.sync_file_with(filepath, None).await
    }

    /// Dry run: the status and modification flag `sync_file` would act on.
    pub async fn status(&self, filepath: &str) -> Result<FileStatus> {
        validate_path(filepath)?;
        let client = self.store.get_record(filepath).await?;
        let live = self.read_live(filepath).await?;
        let server = self.remote("getUpdate", self.api.get_update(filepath)).await?;
        Ok(FileStatus {
            filepath: filepath.to_string(),
            status: sync_status(client.as_ref(), server.as_ref()),
            modified: is_modified(&live.hash, client.as_ref()),
            client,
            server,
        })
    }

    /// `known_server` carries the remote record when the caller already has
    /// it (the pull pass), saving a round trip.
    async fn sync_file_with(
        &self,
        filepath: &str,
        known_server: Option<Option<Update>>,
    ) -> Result<SyncResult> {
        let mut known_server = known_server;
        let mut attempt = 0;

        let outcome = loop {
            match self.reconcile(filepath, known_server.take()).await {
                Err(SyncError::StaleBase { .. }) if attempt < self.config.stale_base_retries => {
                    attempt += 1;
                    tracing::warn!(%filepath, attempt, "lost compare-and-swap, re-syncing");
                }
                other => break other,
            }
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(e) if e.is_fatal() => {
                tracing::error!(%filepath, error = %e, "local ledger failure");
                Err(e)
            }
            Err(e) => {
                tracing::warn!(%filepath, error = %e, "file sync failed");
                let detail = e.to_string();
                Ok(if e.is_server_side() {
                    SyncResult::ServerError { detail }
                } else {
                    SyncResult::ClientError { detail }
                })
            }
        }
    }

    /// One evaluation of the decision table, and its execution.
    async fn reconcile(&self, filepath: &str, known_server: Option<Option<Update>>) -> Result<SyncResult> {
        validate_path(filepath)?;
        self.check_size(filepath).await?;

        let client = self.store.get_record(filepath).await?;
        let live = self.read_live(filepath).await?;
        let modified = is_modified(&live.hash, client.as_ref());

        let server = match known_server {
            Some(server) => server,
            None => self.remote("getUpdate", self.api.get_update(filepath)).await?,
        };

        let status = sync_status(client.as_ref(), server.as_ref());
        let action = decide(status, modified);
        tracing::debug!(%filepath, ?status, modified, ?action, "decided");

        match action {
            SyncAction::BadSync => {
                tracing::warn!(
                    %filepath,
                    client = ?client,
                    server = ?server,
                    "local ledger is ahead of the vault, leaving file untouched"
                );
                Ok(SyncResult::BadSync)
            }
            SyncAction::InSync => Ok(SyncResult::InSync),
            SyncAction::Pull => match server {
                Some(server) => {
                    self.apply_server(&server).await?;
                    tracing::info!(%filepath, hash = %server.hash, time = server.time, "pulled");
                    Ok(SyncResult::Pulled)
                }
                None => Ok(SyncResult::InSync),
            },
            SyncAction::Conflict => match server {
                Some(server) => self.resolve_conflict(filepath, &live, &server).await,
                None => Ok(SyncResult::InSync),
            },
            SyncAction::Push => self.push(filepath, client.as_ref(), live).await,
        }
    }

    async fn push(&self, filepath: &str, client: Option<&Update>, live: LiveFile) -> Result<SyncResult> {
        let base = client.map(|r| r.hash);
        let upload = match live.data {
            Some(data) => Upload::Content(data),
            None => Upload::Delete,
        };

        let receipt = self
            .remote("uploadFile", self.api.upload_file(filepath, base.as_ref(), upload))
            .await?;
        if receipt.new_hash != live.hash {
            return Err(SyncError::InvalidResponse(format!(
                "vault recorded {} for {filepath}, expected {}",
                receipt.new_hash, live.hash
            )));
        }

        self.store
            .update_record(filepath, &receipt.new_hash, receipt.time)
            .await?;
        tracing::info!(%filepath, hash = %receipt.new_hash, time = receipt.time, "pushed");
        Ok(SyncResult::Pushed)
    }

    async fn resolve_conflict(&self, filepath: &str, live: &LiveFile, server: &Update) -> Result<SyncResult> {
        // Both sides made the same change, or a pull was interrupted between
        // its content write and its ledger write.
        if live.hash == server.hash {
            self.store
                .update_record(filepath, &server.hash, server.time)
                .await?;
            tracing::info!(%filepath, "live file already matches vault, adopted record");
            return Ok(SyncResult::Pulled);
        }

        // Deleted locally, edited remotely: nothing to save aside.
        if live.data.is_none() {
            self.apply_server(server).await?;
            tracing::info!(%filepath, "restored remotely edited file deleted locally");
            return Ok(SyncResult::Pulled);
        }

        let conflict_file = conflict_path(filepath, now_millis());
        self.fs.copy_to(filepath, &conflict_file).await?;
        self.apply_server(server).await?;
        tracing::info!(%filepath, %conflict_file, "conflict, local copy saved aside");
        Ok(SyncResult::Conflict { conflict_file })
    }

    /// Make the local file and ledger match a remote record.
    async fn apply_server(&self, record: &Update) -> Result<()> {
        let filepath = record.filepath.as_str();

        if record.is_tombstone() {
            match self.fs.remove(filepath).await {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            match self.remote("getFile", self.api.get_file(filepath)).await? {
                FileState::Content(data) if ContentHash::of(&data) == record.hash => {
                    self.fs.write_to(filepath, &data).await?;
                }
                // The vault moved on after the record was read.
                FileState::Content(_) | FileState::Deleted => {
                    return Err(SyncError::StaleBase {
                        filepath: filepath.to_string(),
                    });
                }
                FileState::NonExistent => {
                    return Err(SyncError::InvalidResponse(format!(
                        "vault tracks {filepath} but has no content for it"
                    )));
                }
            }
        }

        self.store
            .update_record(filepath, &record.hash, record.time)
            .await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Whole tree
    // ─────────────────────────────────────────────────────────────────────────

    /// Pull pass, then push pass.
    pub async fn sync_all(&self) -> Result<SyncReport> {
        let rules = self.ignore_rules().await?;
        let mut report = SyncReport::default();

        let pulled = self.pull_pass(&rules, &mut report).await?;
        self.push_pass(&rules, &pulled, &mut report).await?;

        tracing::info!(
            files = report.len(),
            good = report.good_count(),
            bad = report.bad_count(),
            watermark_advanced = report.watermark_advanced,
            "sync finished"
        );
        Ok(report)
    }

    /// Sync every remote update newer than the watermark. Returns the paths
    /// it handled.
    async fn pull_pass(&self, rules: &IgnoreRules, report: &mut SyncReport) -> Result<HashSet<String>> {
        let started = now_millis();
        let since = self.store.get_last_pull().await?;

        let updates = match self.remote("updatesSince", self.api.updates_since(since)).await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, since, "could not list remote updates");
                report.pull_error = Some(e.to_string());
                return Ok(HashSet::new());
            }
        };
        let updates: Vec<Update> = updates
            .into_iter()
            .filter(|u| !rules.is_ignored(&u.filepath))
            .collect();
        tracing::debug!(count = updates.len(), since, "pull pass");

        let results: Vec<(String, SyncResult)> = stream::iter(updates)
            .map(|update| async move {
                let filepath = update.filepath.clone();
                let result = self.sync_file_with(&filepath, Some(Some(update))).await?;
                Ok::<_, SyncError>((filepath, result))
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let complete = results.iter().all(|(_, r)| {
            !matches!(
                r,
                SyncResult::ClientError { .. } | SyncResult::ServerError { .. }
            )
        });
        if complete {
            // Writes stamped within the starting millisecond may have landed
            // after the listing; the next pass re-examines them.
            self.store.set_last_pull(started - 1).await?;
            report.watermark_advanced = true;
        }

        let mut handled = HashSet::with_capacity(results.len());
        for (filepath, result) in results {
            handled.insert(filepath.clone());
            report.push(filepath, result);
        }
        Ok(handled)
    }

    async fn push_pass(
        &self,
        rules: &IgnoreRules,
        skip: &HashSet<String>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let modified: Vec<String> = self
            .modified_with(rules)
            .await?
            .into_iter()
            .filter(|p| !skip.contains(p))
            .collect();
        tracing::debug!(count = modified.len(), "push pass");

        let results: Vec<(String, SyncResult)> = stream::iter(modified)
            .map(|filepath| async move {
                let result = self.sync_file_with(&filepath, None).await?;
                Ok::<_, SyncError>((filepath, result))
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        for (filepath, result) in results {
            report.push(filepath, result);
        }
        Ok(())
    }

    /// Dry run of the push pass: every non-ignored path whose live bytes
    /// differ from the local ledger, including local deletions. Sorted.
    pub async fn modified_files(&self) -> Result<Vec<String>> {
        let rules = self.ignore_rules().await?;
        self.modified_with(&rules).await
    }

    async fn modified_with(&self, rules: &IgnoreRules) -> Result<Vec<String>> {
        let mut candidates: BTreeSet<String> = self.fs.listdir("", true).await?.into_iter().collect();
        for record in self.store.get_all_records().await? {
            candidates.insert(record.filepath);
        }
        let candidates: Vec<String> = candidates
            .into_iter()
            .filter(|p| !rules.is_ignored(p))
            .collect();

        let flagged: Vec<Option<String>> = stream::iter(candidates)
            .map(|filepath| async move {
                match self.is_locally_modified(&filepath).await {
                    Ok(modified) => Ok(modified.then_some(filepath)),
                    Err(e) if e.is_fatal() => Err(e),
                    // Unreadable paths go to sync_file, which reports them.
                    Err(e) => {
                        tracing::debug!(%filepath, error = %e, "could not inspect local file");
                        Ok(Some(filepath))
                    }
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .try_collect()
            .await?;

        let mut modified: Vec<String> = flagged.into_iter().flatten().collect();
        modified.sort();
        Ok(modified)
    }

    async fn is_locally_modified(&self, filepath: &str) -> Result<bool> {
        // Oversized files are handed to sync_file so they get reported.
        if self.fs.exists(filepath).await? && self.fs.size_of(filepath).await? > self.config.max_file_size {
            return Ok(true);
        }
        let client = self.store.get_record(filepath).await?;
        let live = self.read_live(filepath).await?;
        Ok(is_modified(&live.hash, client.as_ref()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Ignore rules from the configured pattern file, empty if it is absent.
    async fn ignore_rules(&self) -> Result<IgnoreRules> {
        match self.fs.read_from(&self.config.ignore_file).await {
            Ok(data) => Ok(IgnoreRules::parse(&String::from_utf8_lossy(&data))?),
            Err(StoreError::NotFound(_)) => Ok(IgnoreRules::empty()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_live(&self, filepath: &str) -> Result<LiveFile> {
        match self.fs.read_from(filepath).await {
            Ok(data) => Ok(LiveFile {
                hash: ContentHash::of(&data),
                data: Some(data),
            }),
            Err(StoreError::NotFound(_)) => Ok(LiveFile {
                data: None,
                hash: ContentHash::Deleted,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn check_size(&self, filepath: &str) -> Result<()> {
        let size = match self.fs.size_of(filepath).await {
            Ok(size) => size,
            Err(StoreError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if size > self.config.max_file_size {
            return Err(SyncError::FileTooLarge {
                filepath: filepath.to_string(),
                size,
                limit: self.config.max_file_size,
            });
        }
        Ok(())
    }

    /// Bound a vault call by the request timeout.
    async fn remote<T>(&self, op: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(format!(
                "{op} took longer than {:?}",
                self.config.request_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use inksync_core::PushReceipt;
    use inksync_store::{LocalFilesystem, MemoryFilesystem, MemoryStore};
    use inksync_vault::Vault;

    use crate::local::LocalVaultApi;

    type TestClient = VaultClient<MemoryStore, MemoryFilesystem, LocalVaultApi>;

    fn memory_vault() -> Arc<Vault> {
        Arc::new(Vault::new("test", MemoryStore::new(), MemoryFilesystem::new()))
    }

    fn client_for(vault: &Arc<Vault>) -> TestClient {
        VaultClient::new(
            MemoryStore::new(),
            MemoryFilesystem::new(),
            LocalVaultApi::new(vault.clone()),
            ClientConfig::default(),
        )
    }

    fn content(data: &[u8]) -> Upload {
        Upload::Content(Bytes::copy_from_slice(data))
    }

    #[tokio::test]
    async fn test_push_new_file() {
        let vault = memory_vault();
        let client = client_for(&vault);
        client.fs().write_to("a.txt", b"hello").await.unwrap();

        assert_eq!(client.sync_file("a.txt").await.unwrap(), SyncResult::Pushed);
        assert_eq!(
            vault.get_current("a.txt").await.unwrap(),
            FileState::Content(Bytes::from_static(b"hello"))
        );
        let local = client.store().get_record("a.txt").await.unwrap().unwrap();
        assert_eq!(Some(local), vault.get_update_for("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_pull_untracked_file() {
        let vault = memory_vault();
        vault.push_update(content(b"X"), "b.txt", None).await.unwrap();
        let client = client_for(&vault);

        assert_eq!(client.sync_file("b.txt").await.unwrap(), SyncResult::Pulled);
        assert_eq!(&client.fs().read_from("b.txt").await.unwrap()[..], b"X");
    }

    #[tokio::test]
    async fn test_second_sync_is_in_sync() {
        let vault = memory_vault();
        let client = client_for(&vault);
        client.fs().write_to("a.txt", b"hello").await.unwrap();

        client.sync_file("a.txt").await.unwrap();
        assert_eq!(client.sync_file("a.txt").await.unwrap(), SyncResult::InSync);
    }

    #[tokio::test]
    async fn test_untracked_everywhere_is_in_sync() {
        let vault = memory_vault();
        let client = client_for(&vault);
        assert_eq!(client.sync_file("ghost.txt").await.unwrap(), SyncResult::InSync);
    }

    #[tokio::test]
    async fn test_conflict_saves_local_copy() {
        let vault = memory_vault();
        let client = client_for(&vault);
        let v1 = vault.push_update(content(b"v1"), "c.txt", None).await.unwrap();
        client.sync_file("c.txt").await.unwrap();

        vault
            .push_update(content(b"server edit"), "c.txt", Some(&v1.new_hash))
            .await
            .unwrap();
        client.fs().write_to("c.txt", b"local edit").await.unwrap();

        let result = client.sync_file("c.txt").await.unwrap();
        let SyncResult::Conflict { conflict_file } = result else {
            panic!("expected conflict, got {result:?}");
        };
        assert!(conflict_file.starts_with("c.txt."));
        assert_eq!(&client.fs().read_from(&conflict_file).await.unwrap()[..], b"local edit");
        assert_eq!(&client.fs().read_from("c.txt").await.unwrap()[..], b"server edit");
        assert_eq!(
            client.store().get_record("c.txt").await.unwrap().unwrap().hash,
            ContentHash::of(b"server edit")
        );
    }

    #[tokio::test]
    async fn test_client_ahead_of_server_is_bad_sync() {
        let vault = memory_vault();
        let client = client_for(&vault);
        let receipt = vault.push_update(content(b"v1"), "d.txt", None).await.unwrap();
        client
            .store()
            .update_record("d.txt", &ContentHash::of(b"v0"), receipt.time + 1000)
            .await
            .unwrap();
        client.fs().write_to("d.txt", b"local").await.unwrap();

        assert_eq!(client.sync_file("d.txt").await.unwrap(), SyncResult::BadSync);
        assert_eq!(&client.fs().read_from("d.txt").await.unwrap()[..], b"local");
        assert_eq!(
            vault.get_current("d.txt").await.unwrap(),
            FileState::Content(Bytes::from_static(b"v1"))
        );
    }

    #[tokio::test]
    async fn test_client_tracked_server_untracked_is_bad_sync() {
        let vault = memory_vault();
        let client = client_for(&vault);
        client
            .store()
            .update_record("e.txt", &ContentHash::of(b"x"), 5)
            .await
            .unwrap();
        assert_eq!(client.sync_file("e.txt").await.unwrap(), SyncResult::BadSync);
    }

    #[tokio::test]
    async fn test_local_delete_pushes_tombstone() {
        let vault = memory_vault();
        let client = client_for(&vault);
        client.fs().write_to("f.txt", b"bye").await.unwrap();
        client.sync_file("f.txt").await.unwrap();

        client.fs().remove("f.txt").await.unwrap();
        assert_eq!(client.modified_files().await.unwrap(), vec!["f.txt".to_string()]);
        assert_eq!(client.sync_file("f.txt").await.unwrap(), SyncResult::Pushed);
        assert_eq!(vault.get_current("f.txt").await.unwrap(), FileState::Deleted);
    }

    #[tokio::test]
    async fn test_convergent_edit_adopts_server_record() {
        let vault = memory_vault();
        let client = client_for(&vault);
        let v1 = vault.push_update(content(b"v1"), "g.txt", None).await.unwrap();
        client.sync_file("g.txt").await.unwrap();

        vault
            .push_update(content(b"same"), "g.txt", Some(&v1.new_hash))
            .await
            .unwrap();
        client.fs().write_to("g.txt", b"same").await.unwrap();

        assert_eq!(client.sync_file("g.txt").await.unwrap(), SyncResult::Pulled);
        assert!(client.fs().listdir("", true).await.unwrap() == vec!["g.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_oversize_file_is_client_error() {
        let vault = memory_vault();
        let config = ClientConfig {
            max_file_size: 4,
            ..ClientConfig::default()
        };
        let client = VaultClient::new(
            MemoryStore::new(),
            MemoryFilesystem::new(),
            LocalVaultApi::new(vault.clone()),
            config,
        );
        client.fs().write_to("big.bin", b"123456789").await.unwrap();

        let result = client.sync_file("big.bin").await.unwrap();
        assert!(matches!(result, SyncResult::ClientError { .. }));
        assert_eq!(vault.get_update_for("big.bin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ignore_rules_filter_modified_files() {
        let vault = memory_vault();
        let client = client_for(&vault);
        client.fs().write_to(".inksyncignore", b"*.log\n").await.unwrap();
        client.fs().write_to("notes.md", b"keep").await.unwrap();
        client.fs().write_to("debug.log", b"skip").await.unwrap();

        let modified = client.modified_files().await.unwrap();
        assert!(modified.contains(&"notes.md".to_string()));
        assert!(!modified.contains(&"debug.log".to_string()));
    }

    #[tokio::test]
    async fn test_sync_all_two_clients_converge() {
        let vault = memory_vault();
        let alice = client_for(&vault);
        let bob = client_for(&vault);

        alice.fs().write_to("shared/a.md", b"from alice").await.unwrap();
        bob.fs().write_to("shared/b.md", b"from bob").await.unwrap();

        let report = alice.sync_all().await.unwrap();
        assert_eq!(report.get("shared/a.md"), Some(&SyncResult::Pushed));

        let report = bob.sync_all().await.unwrap();
        assert_eq!(report.get("shared/a.md"), Some(&SyncResult::Pulled));
        assert_eq!(report.get("shared/b.md"), Some(&SyncResult::Pushed));
        assert!(report.watermark_advanced);

        alice.sync_all().await.unwrap();
        assert_eq!(&alice.fs().read_from("shared/b.md").await.unwrap()[..], b"from bob");
        assert_eq!(&bob.fs().read_from("shared/a.md").await.unwrap()[..], b"from alice");

        let quiet = alice.sync_all().await.unwrap();
        assert!(quiet.results.iter().all(|o| o.result == SyncResult::InSync));
    }

    #[tokio::test]
    async fn test_status_dry_run_does_not_mutate() {
        let vault = memory_vault();
        let client = client_for(&vault);
        client.fs().write_to("a.txt", b"hello").await.unwrap();

        let status = client.status("a.txt").await.unwrap();
        assert_eq!(status.status, SyncStatus::InSync);
        assert!(status.modified);
        assert_eq!(status.action(), SyncAction::Push);
        assert_eq!(vault.get_update_for("a.txt").await.unwrap(), None);
    }

    /// Wraps a real vault and lets another writer sneak in before the first
    /// upload.
    struct RacingApi {
        inner: LocalVaultApi,
        raced: tokio::sync::Mutex<bool>,
    }

    #[async_trait]
    impl VaultApi for RacingApi {
        async fn ping(&self) -> Result<String> {
            self.inner.ping().await
        }

        async fn updates_since(&self, time: i64) -> Result<Vec<Update>> {
            self.inner.updates_since(time).await
        }

        async fn upload_file(
            &self,
            filepath: &str,
            current_hash: Option<&ContentHash>,
            upload: Upload,
        ) -> Result<PushReceipt> {
            let mut raced = self.raced.lock().await;
            if !*raced {
                *raced = true;
                let on_record = self.inner.get_update(filepath).await?.map(|u| u.hash);
                self.inner
                    .upload_file(filepath, on_record.as_ref(), content(b"other writer"))
                    .await?;
            }
            drop(raced);
            self.inner.upload_file(filepath, current_hash, upload).await
        }

        async fn get_file(&self, filepath: &str) -> Result<FileState> {
            self.inner.get_file(filepath).await
        }

        async fn get_update(&self, filepath: &str) -> Result<Option<Update>> {
            self.inner.get_update(filepath).await
        }
    }

    #[tokio::test]
    async fn test_lost_push_resyncs_into_conflict() {
        let vault = memory_vault();
        let api = RacingApi {
            inner: LocalVaultApi::new(vault.clone()),
            raced: tokio::sync::Mutex::new(false),
        };
        let client = VaultClient::new(
            MemoryStore::new(),
            MemoryFilesystem::new(),
            api,
            ClientConfig::default(),
        );
        client.fs().write_to("race.txt", b"mine").await.unwrap();

        let result = client.sync_file("race.txt").await.unwrap();
        assert!(matches!(result, SyncResult::Conflict { .. }), "got {result:?}");
        assert_eq!(&client.fs().read_from("race.txt").await.unwrap()[..], b"other writer");
    }

    #[tokio::test]
    async fn test_lost_push_without_retries_is_server_error() {
        let vault = memory_vault();
        let api = RacingApi {
            inner: LocalVaultApi::new(vault.clone()),
            raced: tokio::sync::Mutex::new(false),
        };
        let config = ClientConfig {
            stale_base_retries: 0,
            ..ClientConfig::default()
        };
        let client = VaultClient::new(MemoryStore::new(), MemoryFilesystem::new(), api, config);
        client.fs().write_to("race.txt", b"mine").await.unwrap();

        let result = client.sync_file("race.txt").await.unwrap();
        assert!(matches!(result, SyncResult::ServerError { .. }), "got {result:?}");
        assert_eq!(&client.fs().read_from("race.txt").await.unwrap()[..], b"mine");
    }

    /// A vault that never answers.
    struct StalledApi;

    #[async_trait]
    impl VaultApi for StalledApi {
        async fn ping(&self) -> Result<String> {
            std::future::pending().await
        }

        async fn updates_since(&self, _time: i64) -> Result<Vec<Update>> {
            std::future::pending().await
        }

        async fn upload_file(
            &self,
            _filepath: &str,
            _current_hash: Option<&ContentHash>,
            _upload: Upload,
        ) -> Result<PushReceipt> {
            std::future::pending().await
        }

        async fn get_file(&self, _filepath: &str) -> Result<FileState> {
            std::future::pending().await
        }

        async fn get_update(&self, _filepath: &str) -> Result<Option<Update>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_timeouts_become_results_and_hold_watermark() {
        let config = ClientConfig {
            request_timeout: Duration::from_millis(50),
            ..ClientConfig::default()
        };
        let client = VaultClient::new(MemoryStore::new(), MemoryFilesystem::new(), StalledApi, config);
        client.fs().write_to("a.txt", b"hello").await.unwrap();

        let report = client.sync_all().await.unwrap();
        assert!(report.pull_error.is_some());
        assert!(!report.watermark_advanced);
        assert!(matches!(report.get("a.txt"), Some(SyncResult::ServerError { .. })));
        assert_eq!(client.store().get_last_pull().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_path_does_not_abort_push_pass() {
        let dir = tempfile::tempdir().unwrap();
        let vault = memory_vault();
        let client = VaultClient::new(
            MemoryStore::new(),
            LocalFilesystem::new(dir.path()),
            LocalVaultApi::new(vault.clone()),
            ClientConfig::default(),
        );
        client.fs().write_to("x", b"plain file").await.unwrap();
        client.fs().write_to("other.txt", b"v1").await.unwrap();
        client.sync_all().await.unwrap();

        // A tracked file becomes a directory and can no longer be read.
        std::fs::remove_file(dir.path().join("x")).unwrap();
        client.fs().write_to("x/y", b"nested").await.unwrap();
        client.fs().write_to("other.txt", b"v2").await.unwrap();

        assert!(client.modified_files().await.unwrap().contains(&"x".to_string()));

        let report = client.sync_all().await.unwrap();
        assert!(matches!(report.get("x"), Some(SyncResult::ClientError { .. })));
        assert_eq!(report.get("other.txt"), Some(&SyncResult::Pushed));
        assert_eq!(report.get("x/y"), Some(&SyncResult::Pushed));
        assert_eq!(
            vault.get_current("other.txt").await.unwrap(),
            FileState::Content(Bytes::from_static(b"v2"))
        );
    }
}
