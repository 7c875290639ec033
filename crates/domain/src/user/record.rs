//! User record.

use common::EntityKey;
use entity_store::Version;
use serde::{Deserialize, Serialize};

use crate::command::{CommandResult, Loaded};
use crate::entity::Entity;

use super::UserError;

/// Status given to a user created by the initializer.
pub const INITIAL_STATUS: &str = "new";

/// Identifier of a device registered to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a new device ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the device ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The user record held by each user entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub devices: Vec<DeviceId>,
}

impl Entity for User {
    type Error = UserError;

    fn entity_type() -> &'static str {
        "User"
    }

    fn initial(_key: &EntityKey) -> Self {
        User {
            name: String::new(),
            status: INITIAL_STATUS.to_string(),
            devices: Vec::new(),
        }
    }
}

impl User {
    /// Creates a user record.
    pub fn new(
        name: impl Into<String>,
        status: impl Into<String>,
        devices: impl IntoIterator<Item = DeviceId>,
    ) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
            devices: devices.into_iter().collect(),
        }
    }

    /// Checks the invariants every committed user record satisfies.
    pub fn validate(&self) -> Result<(), UserError> {
        if self.name.trim().is_empty() {
            return Err(UserError::NameRequired);
        }
        if self.status.trim().is_empty() {
            return Err(UserError::StatusRequired);
        }
        for (i, device) in self.devices.iter().enumerate() {
            if device.is_blank() {
                return Err(UserError::DeviceIdRequired);
            }
            if self.devices[..i].contains(device) {
                return Err(UserError::DuplicateDevice {
                    device: device.clone(),
                });
            }
        }
        Ok(())
    }

    /// Returns true if the device is registered to this user.
    pub fn has_device(&self, device: &DeviceId) -> bool {
        self.devices.contains(device)
    }
}

/// A user record together with its key and committed version.
///
/// This is the reply shape of every user command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    pub key: EntityKey,
    pub version: Version,
    pub exists: bool,
    #[serde(flatten)]
    pub user: User,
}

impl UserState {
    /// Builds the reply for a read.
    pub fn from_loaded(loaded: Loaded<User>) -> Self {
        Self {
            key: loaded.key,
            version: loaded.version,
            exists: loaded.exists,
            user: loaded.state,
        }
    }

    /// Builds the reply for an executed command.
    pub fn from_result<R>(key: EntityKey, result: CommandResult<User, R>, exists: bool) -> Self {
        Self {
            key,
            version: result.version,
            exists,
            user: result.state,
        }
    }
}
