//! Client tuning knobs.

use std::time::Duration;

use inksync_core::IGNORE_FILE;

/// Default upload ceiling: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Configuration for a [`VaultClient`](crate::VaultClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Files larger than this are reported as `client-error` without
    /// contacting the vault.
    pub max_file_size: u64,
    /// Files synced in parallel during a whole-tree sync.
    pub concurrency: usize,
    /// Upper bound on any single vault call.
    pub request_timeout: Duration,
    /// Root-relative path of the ignore-pattern file.
    pub ignore_file: String,
    /// How many times a push that lost a compare-and-swap re-runs the
    /// per-file decision before giving up.
    pub stale_base_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            concurrency: 8,
            request_timeout: Duration::from_secs(30),
            ignore_file: IGNORE_FILE.to_string(),
            stale_base_retries: 1,
        }
    }
}
