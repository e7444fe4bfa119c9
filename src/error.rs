//! Error types
//!
//! `StoreError` is the closed taxonomy returned by the storage core. Callers
//! match on the variant (or on [`StoreErrorKind`]) to decide between retrying
//! and surfacing the failure. `ApiError` wraps it for the process-level glue
//! (configuration, logging, CLI).

use std::path::PathBuf;
use thiserror::Error;

/// Storage core errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be opened, or a physical I/O call failed.
    #[error("store unavailable at {}: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: sled::Error,
    },

    /// The key is absent. A normal outcome, not a fault.
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("failed to encode record: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode record: {reason}")]
    Decode {
        reason: String,
        #[source]
        source: Option<bincode::Error>,
    },
}

/// Variant tag of a [`StoreError`], without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Unavailable,
    NotFound,
    Encode,
    Decode,
}

impl StoreError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: sled::Error) -> Self {
        StoreError::Unavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Unavailable {
            path: path.into(),
            source: sled::Error::Io(source),
        }
    }

    pub(crate) fn not_found(key: &[u8]) -> Self {
        StoreError::NotFound {
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }

    pub(crate) fn encode(reason: impl Into<String>) -> Self {
        StoreError::Encode(Box::new(bincode::ErrorKind::Custom(reason.into())))
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        StoreError::Decode {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Unavailable { .. } => StoreErrorKind::Unavailable,
            StoreError::NotFound { .. } => StoreErrorKind::NotFound,
            StoreError::Encode(_) => StoreErrorKind::Encode,
            StoreError::Decode { .. } => StoreErrorKind::Decode,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == StoreErrorKind::NotFound
    }

    /// Only unavailability is transient; data errors and absence are not.
    pub fn is_retryable(&self) -> bool {
        self.kind() == StoreErrorKind::Unavailable
    }
}

/// Process-level errors for configuration, logging and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}
