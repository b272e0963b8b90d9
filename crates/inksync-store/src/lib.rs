//! # Inksync Store
//!
//! The two leaf capabilities every replica is built on: the change ledger
//! ([`Store`]) and byte-level file access ([`Filesystem`]).
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for ledger operations
//! - [`SqliteStore`] - SQLite-based persistent ledger
//! - [`MemoryStore`] - In-memory ledger for tests
//! - [`Filesystem`] - The async trait for file operations under a root
//! - [`LocalFilesystem`] / [`MemoryFilesystem`] - Disk and in-memory trees
//!
//! ## Usage
//!
//! ```rust,no_run
//! use inksync_core::ContentHash;
//! use inksync_store::{SqliteStore, Store};
//!
//! async fn example() -> inksync_store::Result<()> {
//!     let ledger = SqliteStore::open(".inksync/ledger.db")?;
//!     ledger.update_record("notes/a.md", &ContentHash::of(b"hello"), 1).await?;
//!     let newer = ledger.get_records_newer_than(0).await?;
//!     assert_eq!(newer.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Exactly-one-row upserts**: any other outcome is a fatal [`StoreError::RowCount`]
//! - **Tombstones**: deletion is a record with the `DELETED` hash, never a removed row
//! - **Monotonic watermark**: `set_last_pull` keeps the maximum it has seen

pub mod error;
pub mod fs;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use fs::{live_hash, Filesystem, LocalFilesystem, MemoryFilesystem};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
