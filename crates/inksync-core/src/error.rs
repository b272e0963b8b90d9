//! Error types for Inksync Core.

use thiserror::Error;

/// Errors raised by the pure primitives in this crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A filepath that is not a clean relative path.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// An ignore pattern that could not be compiled.
    #[error("invalid ignore pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A hash string that is neither a content digest nor the deletion sentinel.
    #[error("invalid hash: {0:?}")]
    InvalidHash(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
