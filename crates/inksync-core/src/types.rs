//! Strong type definitions for ledger records and file payloads.
//!
//! Hashes are carried as a typed enum rather than bare strings so that the
//! deletion sentinel can never be confused with a real digest.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Wire spelling of the deletion sentinel.
pub const DELETED_SENTINEL: &str = "DELETED";

/// Hash of a file's raw bytes, or the tombstone sentinel.
///
/// Digests render as 64 lowercase hex characters (Blake3), so the
/// `DELETED` spelling is unreachable by the content hash function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContentHash {
    /// Blake3 digest of the exact raw bytes.
    Digest([u8; 32]),
    /// The file was logically deleted.
    Deleted,
}

impl ContentHash {
    /// Hash raw file bytes.
    pub fn of(data: &[u8]) -> Self {
        Self::Digest(*blake3::hash(data).as_bytes())
    }

    /// Parse the wire form (`DELETED` or 64 hex chars).
    pub fn parse(s: &str) -> Result<Self> {
        if s == DELETED_SENTINEL {
            return Ok(Self::Deleted);
        }
        if s.len() != 64 || s.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(CoreError::InvalidHash(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidHash(s.to_string()))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self::Digest(arr))
    }

    /// Parse the "current hash" field of a push, where the empty string
    /// means the caller believes the file is untracked.
    pub fn parse_base(s: &str) -> Result<Option<Self>> {
        if s.is_empty() {
            Ok(None)
        } else {
            Self::parse(s).map(Some)
        }
    }

    /// Render an optional base hash, using the empty string for untracked.
    pub fn base_to_wire(base: Option<&ContentHash>) -> String {
        base.map(ContentHash::to_string).unwrap_or_default()
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(bytes) => write!(f, "{}", hex::encode(bytes)),
            Self::Deleted => f.write_str(DELETED_SENTINEL),
        }
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(bytes) => write!(f, "ContentHash({})", &hex::encode(bytes)[..16]),
            Self::Deleted => f.write_str("ContentHash(DELETED)"),
        }
    }
}

impl TryFrom<String> for ContentHash {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_string()
    }
}

/// One ledger record: the latest accepted write to a filepath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// Relative, `/`-separated path; the primary key.
    pub filepath: String,
    /// Hash of the raw bytes at `time`, or the tombstone.
    pub hash: ContentHash,
    /// Server-assigned time in Unix ms.
    pub time: i64,
}

impl Update {
    pub fn new(filepath: impl Into<String>, hash: ContentHash, time: i64) -> Self {
        Self {
            filepath: filepath.into(),
            hash,
            time,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.hash.is_deleted()
    }
}

/// What the vault hands back after accepting a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReceipt {
    pub time: i64,
    pub new_hash: ContentHash,
}

/// Payload of a push: new bytes, or a request to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upload {
    Content(Bytes),
    Delete,
}

impl Upload {
    /// The hash the ledger will record if this upload is accepted.
    pub fn hash(&self) -> ContentHash {
        match self {
            Self::Content(data) => ContentHash::of(data),
            Self::Delete => ContentHash::Deleted,
        }
    }
}

/// The authoritative state of a file as served by a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Content(Bytes),
    Deleted,
    NonExistent,
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
