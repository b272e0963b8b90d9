//! Error types for the vault module.

use inksync_core::{ContentHash, CoreError};
use inksync_store::StoreError;
use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Ledger or filesystem failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The caller's base hash is not the one on record.
    ///
    /// Expected under concurrent writers; the caller must re-sync the file
    /// rather than retry the same write.
    #[error("stale base for {filepath}: on record {}, provided {}", display_base(.on_record), display_base(.provided))]
    StaleBase {
        filepath: String,
        on_record: Option<ContentHash>,
        provided: Option<ContentHash>,
    },

    /// The ledger tracks content that is missing from the tree.
    #[error("content missing for tracked file {0}")]
    MissingContent(String),

    /// Writes into the metadata directory are refused.
    #[error("reserved path: {0}")]
    ReservedPath(String),

    /// Invalid filepath.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No vault registered under this name.
    #[error("unknown vault: {0}")]
    UnknownVault(String),

    /// Two vaults registered under one name.
    #[error("duplicate vault name: {0}")]
    DuplicateVault(String),
}

fn display_base(hash: &Option<ContentHash>) -> String {
    match hash {
        Some(hash) => hash.to_string(),
        None => "<untracked>".to_string(),
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
