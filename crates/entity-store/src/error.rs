use thiserror::Error;

use crate::{EntityKey, Version};

/// Errors that can occur when interacting with the entity store.
#[derive(Debug, Error)]
pub enum EntityStoreError {
    /// Another writer committed to the key first.
    /// The expected version did not match the committed version.
    #[error("Write conflict for entity {key}: expected version {expected}, found {actual}")]
    WriteConflict {
        key: EntityKey,
        expected: Version,
        actual: Version,
    },

    /// The change was rejected before reaching storage.
    #[error("Invalid change: {0}")]
    InvalidChange(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EntityStoreError {
    /// Returns true if this is a lost-update rejection.
    pub fn is_write_conflict(&self) -> bool {
        matches!(self, EntityStoreError::WriteConflict { .. })
    }
}

/// Result type for entity store operations.
pub type Result<T> = std::result::Result<T, EntityStoreError>;
