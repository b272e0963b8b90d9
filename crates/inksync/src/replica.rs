//! A client replica rooted at a directory on disk.

use std::path::Path;

use inksync_core::META_DIR;
use inksync_store::{LocalFilesystem, SqliteStore};
use inksync_sync::{ClientConfig, VaultApi, VaultClient};

/// Client ledger file name inside the metadata directory.
pub const CLIENT_LEDGER: &str = "ledger.db";

/// A client whose ledger is SQLite and whose tree is a local directory.
pub type DiskClient<A> = VaultClient<SqliteStore, LocalFilesystem, A>;

/// Open the replica rooted at `root`, keeping its ledger at
/// `<root>/.inksync/ledger.db`.
pub fn open_client<A: VaultApi>(
    root: &Path,
    api: A,
    config: ClientConfig,
) -> inksync_store::Result<DiskClient<A>> {
    let ledger = SqliteStore::open(root.join(META_DIR).join(CLIENT_LEDGER))?;
    tracing::debug!(root = %root.display(), "opened replica");
    Ok(VaultClient::new(ledger, LocalFilesystem::new(root), api, config))
}
