//! User service providing a simplified API for user operations.

use entity_store::EntityStore;

use crate::command::{Effect, EntityHandler};
use crate::error::DomainError;

use super::{
    AddDevice, ChangeStatus, CreateUser, DeleteUser, GetUser, RemoveDevice, RenameUser,
    UpdateUser, User, UserError, UserState,
};

impl From<UserError> for DomainError {
    fn from(e: UserError) -> Self {
        DomainError::User(e)
    }
}

/// Service for managing users.
///
/// Wraps the entity handler and maps each user command onto a decision
/// about the stored record. Partial changes (rename, status, devices) apply
/// to the initializer's record when the key has no live user, and like
/// every other write they only commit a record that passes
/// [`User::validate`].
pub struct UserService<S: EntityStore> {
    handler: EntityHandler<S, User>,
}

impl<S: EntityStore> UserService<S> {
    /// Creates a new user service with the given entity store.
    pub fn new(store: S) -> Self {
        Self {
            handler: EntityHandler::new(store),
        }
    }

    /// Returns a reference to the underlying entity handler.
    pub fn handler(&self) -> &EntityHandler<S, User> {
        &self.handler
    }

    /// Returns the current state of a user.
    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, query: GetUser) -> Result<UserState, DomainError> {
        let loaded = self.handler.load(&query.key).await?;
        Ok(UserState::from_loaded(loaded))
    }

    /// Creates a user. Fails if a live user already exists under the key.
    #[tracing::instrument(skip(self))]
    pub async fn create_user(&self, cmd: CreateUser) -> Result<UserState, DomainError> {
        let user = cmd.record();

        let result = self
            .handler
            .execute(&cmd.key, |loaded| {
                if loaded.exists {
                    return Err(UserError::AlreadyExists {
                        key: loaded.key.clone(),
                    });
                }
                user.validate()?;
                Ok((Effect::Update(user), ()))
            })
            .await?;

        Ok(UserState::from_result(cmd.key, result, true))
    }

    /// Replaces a user's whole record.
    #[tracing::instrument(skip(self))]
    pub async fn update_user(&self, cmd: UpdateUser) -> Result<UserState, DomainError> {
        let user = cmd.record();

        let result = self
            .handler
            .execute(&cmd.key, |_| {
                user.validate()?;
                Ok((Effect::Update(user), ()))
            })
            .await?;

        Ok(UserState::from_result(cmd.key, result, true))
    }

    /// Changes a user's name.
    #[tracing::instrument(skip(self))]
    pub async fn rename_user(&self, cmd: RenameUser) -> Result<UserState, DomainError> {
        if cmd.name.trim().is_empty() {
            return Err(UserError::NameRequired.into());
        }

        let result = self
            .handler
            .execute(&cmd.key, |loaded| {
                if loaded.exists && loaded.state.name == cmd.name {
                    return Ok((Effect::None, ()));
                }
                let mut user = loaded.state.clone();
                user.name = cmd.name.clone();
                user.validate()?;
                Ok((Effect::Update(user), ()))
            })
            .await?;

        Ok(UserState::from_result(cmd.key, result, true))
    }

    /// Changes a user's status. Setting the current status commits nothing.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(&self, cmd: ChangeStatus) -> Result<UserState, DomainError> {
        if cmd.status.trim().is_empty() {
            return Err(UserError::StatusRequired.into());
        }

        let result = self
            .handler
            .execute(&cmd.key, |loaded| {
                if loaded.exists && loaded.state.status == cmd.status {
                    return Ok((Effect::None, ()));
                }
                let mut user = loaded.state.clone();
                user.status = cmd.status.clone();
                user.validate()?;
                Ok((Effect::Update(user), ()))
            })
            .await?;

        Ok(UserState::from_result(cmd.key, result, true))
    }

    /// Registers a device to a user.
    #[tracing::instrument(skip(self))]
    pub async fn add_device(&self, cmd: AddDevice) -> Result<UserState, DomainError> {
        if cmd.device.is_blank() {
            return Err(UserError::DeviceIdRequired.into());
        }

        let result = self
            .handler
            .execute(&cmd.key, |loaded| {
                if loaded.state.has_device(&cmd.device) {
                    return Err(UserError::DeviceAlreadyRegistered {
                        device: cmd.device.clone(),
                    });
                }
                let mut user = loaded.state.clone();
                user.devices.push(cmd.device.clone());
                user.validate()?;
                Ok((Effect::Update(user), ()))
            })
            .await?;

        Ok(UserState::from_result(cmd.key, result, true))
    }

    /// Unregisters a device from a user.
    #[tracing::instrument(skip(self))]
    pub async fn remove_device(&self, cmd: RemoveDevice) -> Result<UserState, DomainError> {
        let result = self
            .handler
            .execute(&cmd.key, |loaded| {
                if !loaded.state.has_device(&cmd.device) {
                    return Err(UserError::DeviceNotFound {
                        device: cmd.device.clone(),
                    });
                }
                let mut user = loaded.state.clone();
                user.devices.retain(|d| d != &cmd.device);
                user.validate()?;
                Ok((Effect::Update(user), ()))
            })
            .await?;

        Ok(UserState::from_result(cmd.key, result, true))
    }

    /// Deletes a user. Fails if no live user exists under the key.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, cmd: DeleteUser) -> Result<UserState, DomainError> {
        let result = self
            .handler
            .execute(&cmd.key, |loaded| {
                if !loaded.exists {
                    return Err(UserError::NotFound {
                        key: loaded.key.clone(),
                    });
                }
                Ok((Effect::Delete, ()))
            })
            .await?;

        Ok(UserState::from_result(cmd.key, result, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::DeviceId;
    use entity_store::{EntityStore, InMemoryEntityStore, Version};

    fn service() -> UserService<InMemoryEntityStore> {
        UserService::new(InMemoryEntityStore::new())
    }

    #[tokio::test]
    async fn get_unseen_user_returns_initializer() {
        let service = service();

        let state = service.get_user(GetUser::new("ghost")).await.unwrap();

        assert!(!state.exists);
        assert_eq!(state.version, Version::initial());
        assert_eq!(state.user.name, "");
        assert_eq!(state.user.status, "new");
        assert!(state.user.devices.is_empty());
    }

    #[tokio::test]
    async fn create_then_update_replaces_record() {
        let service = service();

        service
            .create_user(CreateUser::new("u1", "A", "active"))
            .await
            .unwrap();
        let updated = service
            .update_user(UpdateUser::new("u1", User::new("B", "active", [])))
            .await
            .unwrap();

        assert_eq!(updated.version, Version::new(2));
        let state = service.get_user(GetUser::new("u1")).await.unwrap();
        assert_eq!(state.user, User::new("B", "active", []));
    }

    #[tokio::test]
    async fn create_existing_user_fails() {
        let service = service();
        service
            .create_user(CreateUser::new("u1", "A", "active"))
            .await
            .unwrap();

        let result = service
            .create_user(CreateUser::new("u1", "Other", "active"))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::User(UserError::AlreadyExists { .. }))
        ));
    }

    #[tokio::test]
    async fn create_rejects_invalid_record() {
        let service = service();

        let result = service.create_user(CreateUser::new("u1", "", "active")).await;

        assert!(matches!(
            result,
            Err(DomainError::User(UserError::NameRequired))
        ));
        assert!(!service.get_user(GetUser::new("u1")).await.unwrap().exists);
    }

    #[tokio::test]
    async fn rename_unseen_user_starts_from_initializer() {
        let service = service();

        let state = service
            .rename_user(RenameUser::new("u1", "Alice"))
            .await
            .unwrap();

        assert!(state.exists);
        assert_eq!(state.version, Version::first());
        assert_eq!(state.user.name, "Alice");
        assert_eq!(state.user.status, "new");
    }

    #[tokio::test]
    async fn status_change_on_unseen_user_needs_a_name() {
        let store = InMemoryEntityStore::new();
        let service = UserService::new(store.clone());

        let result = service
            .change_status(ChangeStatus::new("u9", "active"))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::User(UserError::NameRequired))
        ));
        assert_eq!(store.change_count().await, 0);
        assert!(!service.get_user(GetUser::new("u9")).await.unwrap().exists);
    }

    #[tokio::test]
    async fn add_device_on_unseen_user_needs_a_name() {
        let store = InMemoryEntityStore::new();
        let service = UserService::new(store.clone());

        let result = service.add_device(AddDevice::new("u8", "phone")).await;

        assert!(matches!(
            result,
            Err(DomainError::User(UserError::NameRequired))
        ));
        assert_eq!(store.change_count().await, 0);
    }

    #[tokio::test]
    async fn remove_device_on_unseen_user_commits_nothing() {
        let store = InMemoryEntityStore::new();
        let service = UserService::new(store.clone());

        let result = service
            .remove_device(RemoveDevice::new("u7", "phone"))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::User(UserError::DeviceNotFound { .. }))
        ));
        assert_eq!(store.change_count().await, 0);
    }

    #[tokio::test]
    async fn every_committed_patch_is_a_valid_user() {
        let store = InMemoryEntityStore::new();
        let service = UserService::new(store.clone());

        service
            .rename_user(RenameUser::new("u1", "Alice"))
            .await
            .unwrap();
        service
            .change_status(ChangeStatus::new("u1", "active"))
            .await
            .unwrap();
        service
            .add_device(AddDevice::new("u1", "phone"))
            .await
            .unwrap();
        service
            .remove_device(RemoveDevice::new("u1", "phone"))
            .await
            .unwrap();

        for change in store.changes_after(0).await.unwrap() {
            let user: User = serde_json::from_value(change.state.unwrap()).unwrap();
            assert!(user.validate().is_ok(), "invalid record committed: {user:?}");
        }
        assert_eq!(store.change_count().await, 4);
    }

    #[tokio::test]
    async fn unchanged_status_commits_nothing() {
        let store = InMemoryEntityStore::new();
        let service = UserService::new(store.clone());
        service
            .create_user(CreateUser::new("u1", "A", "active"))
            .await
            .unwrap();

        let state = service
            .change_status(ChangeStatus::new("u1", "active"))
            .await
            .unwrap();

        assert!(state.exists);
        assert_eq!(state.version, Version::first());
        assert_eq!(store.change_count().await, 1);
    }

    #[tokio::test]
    async fn devices_are_added_and_removed() {
        let service = service();
        service
            .create_user(CreateUser::new("u1", "A", "active"))
            .await
            .unwrap();

        service
            .add_device(AddDevice::new("u1", "phone"))
            .await
            .unwrap();
        let duplicate = service.add_device(AddDevice::new("u1", "phone")).await;
        assert!(matches!(
            duplicate,
            Err(DomainError::User(UserError::DeviceAlreadyRegistered { .. }))
        ));

        let state = service
            .remove_device(RemoveDevice::new("u1", "phone"))
            .await
            .unwrap();
        assert!(state.user.devices.is_empty());

        let missing = service
            .remove_device(RemoveDevice::new("u1", "phone"))
            .await;
        assert!(matches!(
            missing,
            Err(DomainError::User(UserError::DeviceNotFound { device })) if device == DeviceId::new("phone")
        ));
    }

    #[tokio::test]
    async fn delete_resets_user_and_requires_live_record() {
        let service = service();
        service
            .create_user(CreateUser::new("u1", "A", "active"))
            .await
            .unwrap();

        let deleted = service.delete_user(DeleteUser::new("u1")).await.unwrap();
        assert!(!deleted.exists);
        assert_eq!(deleted.version, Version::new(2));

        let again = service.delete_user(DeleteUser::new("u1")).await;
        assert!(matches!(
            again,
            Err(DomainError::User(UserError::NotFound { .. }))
        ));

        let recreated = service
            .create_user(CreateUser::new("u1", "A2", "active"))
            .await
            .unwrap();
        assert_eq!(recreated.version, Version::new(3));
    }
}
