//! Object storage errors.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object storage is not configured: {0}")]
    Config(String),

    #[error("Could not store {key}: {reason}")]
    Put { key: String, reason: String },

    #[error("Could not remove {key}: {reason}")]
    Delete { key: String, reason: String },

    #[error("Object key {0:?} is not allowed")]
    InvalidKey(String),
}

impl StorageError {
    pub fn put(key: &str, reason: impl ToString) -> Self {
        Self::Put {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn delete(key: &str, reason: impl ToString) -> Self {
        Self::Delete {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Failures of the remote bucket rather than of the caller's input.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Put { .. } | Self::Delete { .. })
    }
}
