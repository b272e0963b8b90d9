//! # Inksync Sync
//!
//! The client side of Inksync: the [`VaultApi`] facade with its in-process
//! and HTTP adapters, and the [`VaultClient`] reconciliation algorithm.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use inksync_store::{LocalFilesystem, SqliteStore};
//! use inksync_sync::{ClientConfig, HttpVaultApi, VaultClient};
//!
//! async fn example() -> inksync_sync::Result<()> {
//!     let config = ClientConfig::default();
//!     let api = HttpVaultApi::new("http://127.0.0.1:3000", "notes", config.request_timeout)?;
//!     let ledger = SqliteStore::open("notes/.inksync/ledger.db")?;
//!     let client = VaultClient::new(ledger, LocalFilesystem::new("notes"), api, config);
//!
//!     let report = client.sync_all().await?;
//!     print!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Model
//!
//! - Every per-file failure becomes a `client-error` or `server-error`
//!   result; one bad file never aborts the batch
//! - A push that loses the vault's compare-and-swap re-runs the decision for
//!   that file, which usually ends in a conflict
//! - Only a broken local ledger escapes as an `Err`

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod local;
pub mod report;
pub mod wire;

pub use api::VaultApi;
pub use client::{FileStatus, VaultClient};
pub use config::{ClientConfig, DEFAULT_MAX_FILE_SIZE};
pub use error::{Result, SyncError};
pub use http::HttpVaultApi;
pub use local::LocalVaultApi;
pub use report::{FileOutcome, SyncReport};
pub use wire::WireError;
