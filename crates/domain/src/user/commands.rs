//! User commands.

use common::EntityKey;
use serde::{Deserialize, Serialize};

use super::{DeviceId, User};

/// Query for the current state of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUser {
    pub key: EntityKey,
}

impl GetUser {
    pub fn new(key: impl Into<EntityKey>) -> Self {
        Self { key: key.into() }
    }
}

/// Command to create a user that does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// The key to create the user under.
    pub key: EntityKey,

    pub name: String,

    pub status: String,

    #[serde(default)]
    pub devices: Vec<DeviceId>,
}

impl CreateUser {
    /// Creates a new CreateUser command.
    pub fn new(key: impl Into<EntityKey>, name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            status: status.into(),
            devices: Vec::new(),
        }
    }

    /// Adds a device to the initial record.
    pub fn with_device(mut self, device: impl Into<DeviceId>) -> Self {
        self.devices.push(device.into());
        self
    }

    /// Returns the record this command would commit.
    pub fn record(&self) -> User {
        User::new(&*self.name, &*self.status, self.devices.iter().cloned())
    }
}

/// Command to replace a user's whole record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUser {
    /// The user to replace.
    pub key: EntityKey,

    pub name: String,

    pub status: String,

    #[serde(default)]
    pub devices: Vec<DeviceId>,
}

impl UpdateUser {
    /// Creates a new UpdateUser command from a full record.
    pub fn new(key: impl Into<EntityKey>, user: User) -> Self {
        Self {
            key: key.into(),
            name: user.name,
            status: user.status,
            devices: user.devices,
        }
    }

    /// Returns the record this command would commit.
    pub fn record(&self) -> User {
        User::new(&*self.name, &*self.status, self.devices.iter().cloned())
    }
}

/// Command to change a user's name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameUser {
    pub key: EntityKey,
    pub name: String,
}

impl RenameUser {
    pub fn new(key: impl Into<EntityKey>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// Command to change a user's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub key: EntityKey,
    pub status: String,
}

impl ChangeStatus {
    pub fn new(key: impl Into<EntityKey>, status: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: status.into(),
        }
    }
}

/// Command to register a device to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddDevice {
    pub key: EntityKey,
    pub device: DeviceId,
}

impl AddDevice {
    pub fn new(key: impl Into<EntityKey>, device: impl Into<DeviceId>) -> Self {
        Self {
            key: key.into(),
            device: device.into(),
        }
    }
}

/// Command to unregister a device from a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveDevice {
    pub key: EntityKey,
    pub device: DeviceId,
}

impl RemoveDevice {
    pub fn new(key: impl Into<EntityKey>, device: impl Into<DeviceId>) -> Self {
        Self {
            key: key.into(),
            device: device.into(),
        }
    }
}

/// Command to delete a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUser {
    pub key: EntityKey,
}

impl DeleteUser {
    pub fn new(key: impl Into<EntityKey>) -> Self {
        Self { key: key.into() }
    }
}
