//! Core error types for focusbee-core.
//!
//! Host-facing failures (storage, rule installation, playback relay) are
//! usually logged and swallowed by the controller. Validation errors are the
//! only kind that reach the user.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusbee-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Network rule installation errors
    #[error("Rule error: {0}")]
    Rules(#[from] RuleError),

    /// Playback context errors
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored blob could not be decoded
    #[error("Corrupt value under '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors for user input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Input is not a usable website domain
    #[error("'{0}' is not a valid website (e.g. youtube.com)")]
    InvalidDomain(String),

    /// Domain already present in the blocklist
    #[error("'{0}' is already in your blocklist")]
    DuplicateDomain(String),

    /// Text input was empty after trimming
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Referenced record does not exist
    #[error("No {kind} with id '{id}'")]
    NotFound { kind: &'static str, id: String },

    /// Unknown ambient sound key
    #[error("Unknown sound '{0}'")]
    UnknownSound(String),
}

/// Errors from the host's declarative rule facility.
#[derive(Error, Debug)]
pub enum RuleError {
    /// A rule id slated for addition is already installed
    #[error("Rule id {0} is already installed")]
    DuplicateId(u32),

    /// Backing store failed while reading or writing the rule table
    #[error("Rule table storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Errors relaying commands to the playback context.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlaybackError {
    /// Nothing is listening on the other side
    #[error("Playback context is not available")]
    Unavailable,

    /// The context never answered the readiness ping
    #[error("Playback context not ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    /// The context rejected the command
    #[error("Playback context rejected command: {0}")]
    Rejected(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
