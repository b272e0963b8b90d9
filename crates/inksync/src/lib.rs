//! # Inksync
//!
//! Multi-device file synchronization. A server holds an authoritative vault
//! (content plus change ledger) per synced directory; clients reconcile
//! local directories against it across offline edits and concurrent
//! writers, surfacing true conflicts instead of silently losing data.
//!
//! ## Key Concepts
//!
//! - **Ledger**: durable `filepath -> (hash, time)` on every replica
//! - **Tombstone**: a deletion is a record with the `DELETED` hash, never a removed row
//! - **CAS push**: the vault accepts a write only if the caller names the hash on record
//! - **Conflict**: the losing local copy is saved aside, the vault's version is adopted
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use inksync::sync::{ClientConfig, HttpVaultApi};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let config = ClientConfig::default();
//!     let api = HttpVaultApi::new("http://127.0.0.1:3000", "notes", config.request_timeout)?;
//!     let client = inksync::open_client(Path::new("notes"), api, config)?;
//!
//!     for outcome in client.sync_all().await?.results {
//!         println!("{}: {}", outcome.filepath, outcome.result);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `inksync::core` - Hashes, records, the decision table, ignore rules
//! - `inksync::store` - Ledger and filesystem capabilities
//! - `inksync::vault` - The server-side authority
//! - `inksync::sync` - Vault transports and the sync client

pub mod config;
pub mod error;
pub mod replica;
pub mod server;

// Re-export component crates
pub use inksync_core as core;
pub use inksync_store as store;
pub use inksync_sync as sync;
pub use inksync_vault as vault;

pub use config::{upload_body_limit, Config, ConfigError};
pub use error::{Result, ServerError};
pub use replica::{open_client, DiskClient, CLIENT_LEDGER};
pub use server::{build_router, serve, ApiError};

// Re-export commonly used types
pub use inksync_core::{ContentHash, SyncResult, Update};
pub use inksync_sync::{SyncReport, VaultClient};
pub use inksync_vault::{Vault, VaultRegistry};
