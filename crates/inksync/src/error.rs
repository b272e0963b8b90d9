//! Error types for the server process.

use inksync_vault::VaultError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A configured vault could not be opened.
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    /// The configuration names no vaults.
    #[error("no vaults configured")]
    NoVaults,

    /// Binding or serving failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
