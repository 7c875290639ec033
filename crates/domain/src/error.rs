//! Domain error types.

use entity_store::EntityStoreError;
use thiserror::Error;

use crate::user::UserError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the entity store.
    #[error("Entity store error: {0}")]
    EntityStore(#[from] EntityStoreError),

    /// No handler is registered under the command name.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A read-only dispatch addressed a handler that may change state.
    #[error("Command {0} is not a query")]
    NotAQuery(String),

    /// Two handlers were registered under the same command name.
    #[error("Command registered twice: {0}")]
    DuplicateCommand(String),

    /// The payload could not be decoded into the command's type.
    #[error("Invalid payload for {command}: {source}")]
    InvalidPayload {
        command: String,
        source: serde_json::Error,
    },

    /// An error occurred in the user entity.
    #[error("User error: {0}")]
    User(UserError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if a commit lost a race with another writer.
    pub fn is_write_conflict(&self) -> bool {
        matches!(self, DomainError::EntityStore(e) if e.is_write_conflict())
    }

    /// Returns true if the router had no handler for the command name.
    pub fn is_unknown_command(&self) -> bool {
        matches!(self, DomainError::UnknownCommand(_))
    }
}
