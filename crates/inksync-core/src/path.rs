//! Relative filepath rules and conflict-file naming.

use crate::error::{CoreError, Result};

/// Directory holding sync metadata (the local ledger) under a synced root.
pub const META_DIR: &str = ".inksync";

/// Fixed suffix carried by every conflict artifact.
pub const CONFLICT_SUFFIX: &str = ".conflict";

/// Check that `path` is a clean relative path: `/`-separated, no leading
/// slash, no empty, `.` or `..` segments, no backslashes or NULs.
pub fn validate_path(path: &str) -> Result<()> {
    let invalid = |reason| {
        Err(CoreError::InvalidPath {
            path: path.to_string(),
            reason,
        })
    };

    if path.is_empty() {
        return invalid("empty path");
    }
    if path.starts_with('/') {
        return invalid("absolute path");
    }
    if path.contains('\\') || path.contains('\0') {
        return invalid("forbidden character");
    }
    for segment in path.split('/') {
        match segment {
            "" => return invalid("empty segment"),
            "." | ".." => return invalid("relative segment"),
            _ => {}
        }
    }
    Ok(())
}

/// Name for the copy of `path` saved aside when a conflict is detected.
///
/// `notes/a.md` at time 1700000000000 becomes
/// `notes/a.md.1700000000000.conflict`.
pub fn conflict_path(path: &str, time: i64) -> String {
    format!("{path}.{time}{CONFLICT_SUFFIX}")
}

pub fn is_conflict_file(path: &str) -> bool {
    path.ends_with(CONFLICT_SUFFIX)
}

/// Whether `path` lives inside the sync metadata directory.
pub fn is_meta_path(path: &str) -> bool {
    path == META_DIR || path.starts_with(&format!("{META_DIR}/"))
}
