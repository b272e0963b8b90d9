//! Error types for the sync module.

use inksync_core::CoreError;
use inksync_store::StoreError;
use inksync_vault::VaultError;
use thiserror::Error;

use crate::wire::WireError;

/// Errors that can occur while talking to a vault or reconciling a file.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local ledger or filesystem failure.
    #[error("local store error: {0}")]
    Store(StoreError),

    /// The local ledger broke its storage contract. Sync must stop.
    #[error("local ledger corrupted: {0}")]
    LedgerCorruption(#[source] StoreError),

    /// In-process vault failure.
    #[error("vault error: {0}")]
    Vault(VaultError),

    /// Invalid filepath or hash.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A compare-and-swap push lost to another writer.
    #[error("stale base for {filepath}: the vault has a newer version")]
    StaleBase { filepath: String },

    /// Connection-level failure reaching the vault.
    #[error("transport error: {0}")]
    Transport(String),

    /// The vault did not answer within the request timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The vault failed while handling the request (5xx).
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The vault refused the request (4xx other than a stale base).
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The vault answered with something that is not a valid response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The local file exceeds the configured upload ceiling.
    #[error("{filepath} is {size} bytes, above the {limit} byte limit")]
    FileTooLarge {
        filepath: String,
        size: u64,
        limit: u64,
    },
}

impl SyncError {
    /// Whether this error is reported as `server-error` rather than
    /// `client-error`.
    pub fn is_server_side(&self) -> bool {
        matches!(
            self,
            Self::Vault(_)
                | Self::StaleBase { .. }
                | Self::Transport(_)
                | Self::Timeout(_)
                | Self::Server { .. }
                | Self::InvalidResponse(_)
        )
    }

    /// Errors that abort a whole-tree sync instead of becoming a per-file
    /// result.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::LedgerCorruption(_))
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        if e.is_fatal() {
            Self::LedgerCorruption(e)
        } else {
            Self::Store(e)
        }
    }
}

impl From<VaultError> for SyncError {
    fn from(e: VaultError) -> Self {
        match e {
            VaultError::StaleBase { filepath, .. } => Self::StaleBase { filepath },
            other => Self::Vault(other),
        }
    }
}

impl From<WireError> for SyncError {
    fn from(e: WireError) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
