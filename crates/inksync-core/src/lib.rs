//! # Inksync Core
//!
//! Pure primitives for Inksync: ledger records, content hashes, the per-file
//! sync decision table, and ignore rules.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`ContentHash`] - Blake3 digest of raw file bytes, or the `DELETED` tombstone
//! - [`Update`] - One ledger record: `(filepath, hash, time)`
//! - [`SyncStatus`] / [`SyncAction`] - The reconciliation decision for one file
//! - [`SyncResult`] - The reported outcome of syncing one file
//! - [`IgnoreRules`] - Gitignore-style exclusion of paths from tree scans

pub mod error;
pub mod ignore;
pub mod path;
pub mod status;
pub mod types;

pub use error::{CoreError, Result};
pub use ignore::{IgnoreRules, IGNORE_FILE};
pub use path::{
    conflict_path, is_conflict_file, is_meta_path, validate_path, CONFLICT_SUFFIX, META_DIR,
};
pub use status::{decide, is_modified, sync_status, Domain, SyncAction, SyncResult, SyncStatus};
pub use types::{
    now_millis, ContentHash, FileState, PushReceipt, Update, Upload, DELETED_SENTINEL,
};
