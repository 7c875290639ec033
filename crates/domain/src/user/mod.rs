//! User value entity and related types.

mod commands;
mod record;
mod service;

pub use commands::*;
pub use record::{DeviceId, User, UserState};
pub use service::UserService;

use common::EntityKey;
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Name must not be empty.
    #[error("User name is required")]
    NameRequired,

    /// Status must not be empty.
    #[error("User status is required")]
    StatusRequired,

    /// Device identifiers must not be empty.
    #[error("Device id is required")]
    DeviceIdRequired,

    /// The same device appears twice in a record.
    #[error("Duplicate device: {device}")]
    DuplicateDevice { device: DeviceId },

    /// Create was addressed to a live user.
    #[error("User already exists: {key}")]
    AlreadyExists { key: EntityKey },

    /// Delete was addressed to a key with no live user.
    #[error("User not found: {key}")]
    NotFound { key: EntityKey },

    /// Device is already registered to the user.
    #[error("Device already registered: {device}")]
    DeviceAlreadyRegistered { device: DeviceId },

    /// Device is not registered to the user.
    #[error("Device not found: {device}")]
    DeviceNotFound { device: DeviceId },
}
