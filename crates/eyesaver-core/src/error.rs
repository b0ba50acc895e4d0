//! Core error types for eyesaver-core.
//!
//! Almost nothing in the timer is allowed to fail loudly: persistence and
//! reminder channels recover locally. These types exist for the places where
//! a caller does want to know, e.g. `config set` with an unknown key or a
//! storage backend reporting a failed write before it gets swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for eyesaver-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Durable storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Settings errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a key-value backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read a stored record
    #[error("Failed to read '{key}' from {path}: {source}")]
    ReadFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a record
    #[error("Failed to write '{key}' to {path}: {source}")]
    WriteFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that cannot be mapped to a file name
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Backend refused the write (quota, read-only media, test double)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Could not determine where local data lives
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Settings-specific errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Key does not name a setting
    #[error("unknown setting: {0}")]
    UnknownKey(String),

    /// Value cannot be coerced into the setting's type
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
