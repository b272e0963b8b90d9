//! The per-file sync decision table and its outcomes.
//!
//! Three independently observed states feed the decision: the live local
//! bytes, the local ledger record and the remote ledger record. Nothing in
//! here performs I/O; the client executes the chosen [`SyncAction`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ContentHash, Update};

/// Agreement between the local and remote ledger records of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStatus {
    InSync,
    OutOfSync,
    /// The local ledger claims a state the server never recorded.
    Invalid,
}

/// Compare ledger records. `None` means the ledger has never tracked the file.
pub fn sync_status(client: Option<&Update>, server: Option<&Update>) -> SyncStatus {
    match (client, server) {
        (None, None) => SyncStatus::InSync,
        (None, Some(_)) => SyncStatus::OutOfSync,
        (Some(_), None) => SyncStatus::Invalid,
        (Some(c), Some(s)) if c.time > s.time => SyncStatus::Invalid,
        (Some(c), Some(s)) if c.hash == s.hash => SyncStatus::InSync,
        (Some(_), Some(_)) => SyncStatus::OutOfSync,
    }
}

/// Whether the live bytes differ from what the local ledger last recorded.
///
/// A missing file hashes as the tombstone, so a file that was never tracked
/// and does not exist is unmodified.
pub fn is_modified(live: &ContentHash, client: Option<&Update>) -> bool {
    let known = client.map(|r| r.hash).unwrap_or(ContentHash::Deleted);
    *live != known
}

/// What the client should do with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Ledger invariant broken; touch nothing.
    BadSync,
    /// Save the live file aside, then adopt the server version.
    Conflict,
    /// Upload the live bytes with a compare-and-swap on the client's hash.
    Push,
    /// Adopt the server version.
    Pull,
    InSync,
}

/// The ordered decision rules.
pub fn decide(status: SyncStatus, modified: bool) -> SyncAction {
    match (status, modified) {
        (SyncStatus::Invalid, _) => SyncAction::BadSync,
        (SyncStatus::OutOfSync, true) => SyncAction::Conflict,
        (_, true) => SyncAction::Push,
        (SyncStatus::OutOfSync, false) => SyncAction::Pull,
        _ => SyncAction::InSync,
    }
}

/// Aggregate classification of a [`SyncResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Good,
    Bad,
}

/// Outcome of syncing one file. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SyncResult {
    Pushed,
    Pulled,
    Conflict {
        #[serde(rename = "conflictFile")]
        conflict_file: String,
    },
    InSync,
    BadSync,
    ClientError {
        detail: String,
    },
    ServerError {
        detail: String,
    },
}

impl SyncResult {
    pub fn domain(&self) -> Domain {
        match self {
            Self::Pushed | Self::Pulled | Self::Conflict { .. } | Self::InSync => Domain::Good,
            Self::BadSync | Self::ClientError { .. } | Self::ServerError { .. } => Domain::Bad,
        }
    }

    pub fn is_good(&self) -> bool {
        self.domain() == Domain::Good
    }

    /// Short machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pushed => "pushed",
            Self::Pulled => "pulled",
            Self::Conflict { .. } => "conflict",
            Self::InSync => "in-sync",
            Self::BadSync => "bad-sync",
            Self::ClientError { .. } => "client-error",
            Self::ServerError { .. } => "server-error",
        }
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { conflict_file } => {
                write!(f, "conflict (local copy saved as {conflict_file})")
            }
            Self::ClientError { detail } | Self::ServerError { detail } => {
                write!(f, "{}: {detail}", self.kind())
            }
            other => f.write_str(other.kind()),
        }
    }
}
