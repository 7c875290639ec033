//! Wiring of domain handlers into a command router.

use std::sync::Arc;

use entity_store::EntityStore;

use crate::error::DomainError;
use crate::greeting::{GreetingAction, Hello, SuggestGame};
use crate::router::RouterBuilder;
use crate::user::{
    AddDevice, ChangeStatus, CreateUser, DeleteUser, GetUser, RemoveDevice, RenameUser,
    UpdateUser, UserService,
};

/// Command names served by [`register_handlers`].
pub mod names {
    pub const GET_USER: &str = "GetUser";
    pub const CREATE_USER: &str = "CreateUser";
    pub const UPDATE_USER: &str = "UpdateUser";
    pub const RENAME_USER: &str = "RenameUser";
    pub const CHANGE_STATUS: &str = "ChangeStatus";
    pub const ADD_DEVICE: &str = "AddDevice";
    pub const REMOVE_DEVICE: &str = "RemoveDevice";
    pub const DELETE_USER: &str = "DeleteUser";
    pub const HELLO: &str = "Hello";
    pub const SUGGEST_GAME: &str = "SuggestGame";
}

/// Registers the user and greeting handlers on a router builder.
///
/// `GetUser` is the only query; greetings are actions; every other user
/// command is an update.
pub fn register_handlers<S>(
    builder: RouterBuilder,
    users: Arc<UserService<S>>,
    greeter: Arc<GreetingAction>,
) -> RouterBuilder
where
    S: EntityStore + 'static,
{
    let builder = {
        let users = Arc::clone(&users);
        builder.query(names::GET_USER, move |query: GetUser| {
            let users = Arc::clone(&users);
            async move { users.get_user(query).await }
        })
    };
    let builder = {
        let users = Arc::clone(&users);
        builder.update(names::CREATE_USER, move |cmd: CreateUser| {
            let users = Arc::clone(&users);
            async move { users.create_user(cmd).await }
        })
    };
    let builder = {
        let users = Arc::clone(&users);
        builder.update(names::UPDATE_USER, move |cmd: UpdateUser| {
            let users = Arc::clone(&users);
            async move { users.update_user(cmd).await }
        })
    };
    let builder = {
        let users = Arc::clone(&users);
        builder.update(names::RENAME_USER, move |cmd: RenameUser| {
            let users = Arc::clone(&users);
            async move { users.rename_user(cmd).await }
        })
    };
    let builder = {
        let users = Arc::clone(&users);
        builder.update(names::CHANGE_STATUS, move |cmd: ChangeStatus| {
            let users = Arc::clone(&users);
            async move { users.change_status(cmd).await }
        })
    };
    let builder = {
        let users = Arc::clone(&users);
        builder.update(names::ADD_DEVICE, move |cmd: AddDevice| {
            let users = Arc::clone(&users);
            async move { users.add_device(cmd).await }
        })
    };
    let builder = {
        let users = Arc::clone(&users);
        builder.update(names::REMOVE_DEVICE, move |cmd: RemoveDevice| {
            let users = Arc::clone(&users);
            async move { users.remove_device(cmd).await }
        })
    };
    let builder = builder.update(names::DELETE_USER, move |cmd: DeleteUser| {
        let users = Arc::clone(&users);
        async move { users.delete_user(cmd).await }
    });

    let builder = {
        let greeter = Arc::clone(&greeter);
        builder.action(names::HELLO, move |request: Hello| {
            let greeting = greeter.hello(request);
            async move { Ok::<_, DomainError>(greeting) }
        })
    };
    builder.action(names::SUGGEST_GAME, move |request: SuggestGame| {
        let suggestion = greeter.suggest_game(request);
        async move { Ok::<_, DomainError>(suggestion) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;
    use crate::router::{CommandRouter, HandlerKind};
    use entity_store::InMemoryEntityStore;

    fn router() -> CommandRouter {
        let users = Arc::new(UserService::new(InMemoryEntityStore::new()));
        let greeter = Arc::new(GreetingAction::new(Arc::new(SeededRandom::from_seed(1))));
        register_handlers(CommandRouter::builder(), users, greeter)
            .build()
            .unwrap()
    }

    #[test]
    fn every_command_is_registered_with_its_kind() {
        let router = router();

        assert_eq!(router.len(), 10);
        assert_eq!(router.kind(names::GET_USER), Some(HandlerKind::Query));
        assert_eq!(router.kind(names::DELETE_USER), Some(HandlerKind::Update));
        assert_eq!(router.kind(names::HELLO), Some(HandlerKind::Action));
        assert_eq!(router.kind(names::SUGGEST_GAME), Some(HandlerKind::Action));
    }

    #[tokio::test]
    async fn hello_dispatches_through_router() {
        let router = router();

        let reply = router
            .dispatch(names::HELLO, serde_json::json!({"name": "Joshua"}))
            .await
            .unwrap();

        assert_eq!(reply["text"], "Do you want to play a game, Joshua?");
    }

    #[tokio::test]
    async fn create_and_get_through_router() {
        let router = router();

        router
            .dispatch(
                names::CREATE_USER,
                serde_json::json!({"key": "u1", "name": "A", "status": "active"}),
            )
            .await
            .unwrap();
        let reply = router
            .dispatch_query(names::GET_USER, serde_json::json!({"key": "u1"}))
            .await
            .unwrap();

        assert_eq!(reply["name"], "A");
        assert_eq!(reply["version"], 1);
        assert_eq!(reply["exists"], true);
    }
}
