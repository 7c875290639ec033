//! HTTP route handlers.

pub mod admin;
pub mod commands;
pub mod health;
pub mod metrics;
pub mod users;

use std::sync::Arc;

use domain::CommandRouter;
use entity_store::EntityStore;
use projections::{ProjectionProcessor, UserView};

/// Shared application state accessible from all handlers.
pub struct AppState<S: EntityStore> {
    pub router: CommandRouter,
    pub user_view: UserView,
    pub entity_store: S,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}
