//! Cache error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored entry exists but does not hold the expected result subset.
    #[error("Corrupt cache entry {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Computed result is missing cached field '{field}'")]
    MissingField { field: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}

pub type CacheResult<T> = Result<T, CacheError>;
