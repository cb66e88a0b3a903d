//! Error types for the dual store.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error on {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capacity exceeded: store holds at most {capacity} records")]
    CapacityExceeded { capacity: usize },

    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl StoreError {
    /// Wrap an IO error with the file it happened on.
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::File {
            path: path.into(),
            source,
        }
    }

    /// Whether ingestion may count this error and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::MalformedRecord { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            StoreError::Deserialization(e.to_string())
        } else {
            StoreError::Serialization(e.to_string())
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
