//! Domain layer for the value-entity service.
//!
//! This crate provides the core domain abstractions including:
//! - Entity trait for key-addressed value entities
//! - EntityHandler for serialized, optimistic command execution
//! - CommandRouter for dispatching named commands to typed handlers
//! - User entity and greeting actions

pub mod command;
pub mod entity;
pub mod error;
pub mod greeting;
pub mod handlers;
pub mod keylock;
pub mod random;
pub mod router;
pub mod user;

pub use command::{CommandResult, Effect, EntityHandler, Loaded};
pub use entity::Entity;
pub use error::DomainError;
pub use greeting::{GameSuggestion, Greeting, GreetingAction, Hello, SuggestGame};
pub use handlers::{names, register_handlers};
pub use keylock::KeyedLocks;
pub use random::{RandomSource, SeededRandom};
pub use router::{CommandRouter, Handler, HandlerKind, RouterBuilder};
pub use user::{
    AddDevice, ChangeStatus, CreateUser, DeleteUser, DeviceId, GetUser, RemoveDevice, RenameUser,
    UpdateUser, User, UserError, UserService, UserState,
};
