//! # Inksync Vault
//!
//! The server-side authority for one synced directory. A [`Vault`] owns an
//! authoritative ledger and the file tree it describes, and accepts writes
//! only as compare-and-swap pushes against the hash on record.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use inksync_core::Upload;
//! use inksync_vault::Vault;
//!
//! async fn example() -> inksync_vault::Result<()> {
//!     let vault = Vault::open("notes", std::path::Path::new("/srv/notes"), None)?;
//!     let receipt = vault
//!         .push_update(Upload::Content(Bytes::from_static(b"# hi")), "today.md", None)
//!         .await?;
//!     vault
//!         .push_update(Upload::Delete, "today.md", Some(&receipt.new_hash))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod registry;
pub mod vault;

pub use error::{Result, VaultError};
pub use registry::VaultRegistry;
pub use vault::{Vault, VAULT_LEDGER};
