//! Error types for the bookmark loader

use thiserror::Error;

/// Result type alias for bookmark operations
pub type Result<T> = std::result::Result<T, BookmarkError>;

/// Main error type for bookmark operations
///
/// Only an empty selection is treated as a normal outcome by the loader;
/// every variant here propagates to the caller unchanged.
#[derive(Error, Debug)]
pub enum BookmarkError {
    #[error("Invalid data format '{0}'. Format should be one of csv, parquet, json, xml")]
    InvalidFormat(String),

    #[error("Failed to provision ledger table '{table}': {reason}")]
    ProvisioningFailed { table: String, reason: String },

    #[error("Ledger table '{table}' was not ready within {timeout_secs} seconds")]
    ProvisioningTimeout { table: String, timeout_secs: u64 },

    #[error("Ledger table '{table}' has {key} key '{actual}', expected '{expected}'")]
    SchemaMismatch {
        table: String,
        key: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Failed to write bookmark to '{table}': {reason}")]
    LedgerWriteFailed { table: String, reason: String },

    #[error("Failed to query bookmarks in '{table}': {reason}")]
    LedgerQueryFailed { table: String, reason: String },

    #[error("Failed to list source objects under '{location}': {reason}")]
    SourceListFailed { location: String, reason: String },

    #[error("Failed to delete source object '{location}': {reason}")]
    SourceDeleteFailed { location: String, reason: String },

    #[error("Failed to read payload '{path}': {reason}")]
    PayloadReadFailed { path: String, reason: String },

    #[error("No in-progress bookmark to commit for job '{0}'")]
    NoPendingProgress(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BookmarkError {
    pub fn payload(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        BookmarkError::PayloadReadFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn ledger_write(table: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        BookmarkError::LedgerWriteFailed {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    pub fn ledger_query(table: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        BookmarkError::LedgerQueryFailed {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}
