//! Error types surfaced by the preference and analytics stores

use crate::backend::StorageError;

/// Failure reading or writing a persisted value
#[derive(Debug, thiserror::Error)]
pub enum StorageAccessError {
    #[error(transparent)]
    Backend(#[from] StorageError),

    #[error("Invalid value stored under '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}
