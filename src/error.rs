//! Error types for bibcache

use thiserror::Error;

/// Result type alias for bibcache operations
pub type Result<T> = std::result::Result<T, BibCacheError>;

/// Error types for bibcache operations
#[derive(Error, Debug)]
pub enum BibCacheError {
    /// Source file could not be resolved or stat'ed
    #[error("Cannot access source file '{path}': {reason}")]
    SourceUnavailable { path: String, reason: String },

    /// Lock marker could not be created or removed
    #[error("Cannot lock '{path}': {reason}")]
    LockFailed { path: String, reason: String },

    /// Lock was not acquired within the configured timeout
    #[error("Timed out after {waited_ms}ms waiting for lock '{path}'")]
    LockTimeout { path: String, waited_ms: u128 },

    /// Cached data or timestamp could not be read
    #[error("Cannot read cache file '{path}': {reason}")]
    CacheRead { path: String, reason: String },

    /// Cached data or timestamp could not be written
    #[error("Cannot write cache file '{path}': {reason}")]
    CacheWrite { path: String, reason: String },

    /// Subcache name would break the flat cache layout
    #[error("Invalid subcache name '{0}'")]
    InvalidSubcache(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed bibliography source
    #[error("Parse error in '{path}' at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
