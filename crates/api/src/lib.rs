//! HTTP API server with observability for the value-entity service.
//!
//! Exposes the command router over HTTP, serves the user view, and
//! reports structured logs (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{
    CommandRouter, DomainError, GreetingAction, RandomSource, UserService, register_handlers,
};
use entity_store::EntityStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{Projection, ProjectionProcessor, UserView};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EntityStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/commands", get(routes::commands::list::<S>))
        .route("/commands/{name}", post(routes::commands::dispatch::<S>))
        .route("/queries/{name}", post(routes::commands::query::<S>))
        .route("/users", get(routes::users::list::<S>))
        .route("/users/{key}", get(routes::users::get::<S>))
        .route("/users/{key}/changes", get(routes::users::changes::<S>))
        .route("/admin/rebuild", post(routes::admin::rebuild::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: the user service and greeter
/// behind an explicitly built router, and the user view fed by a
/// projection processor.
///
/// The processor is returned unstarted; call
/// [`ProjectionProcessor::spawn_live`] to keep the view current.
pub fn create_default_state<S: EntityStore + Clone + 'static>(
    entity_store: S,
    random: Arc<dyn RandomSource>,
) -> Result<(Arc<AppState<S>>, Arc<ProjectionProcessor<S>>), DomainError> {
    let users = Arc::new(UserService::new(entity_store.clone()));
    let greeter = Arc::new(GreetingAction::new(random));
    let router = register_handlers(CommandRouter::builder(), users, greeter).build()?;

    let user_view = UserView::new();
    let mut processor = ProjectionProcessor::new(entity_store.clone());
    processor.register(Box::new(user_view.clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    let state = Arc::new(AppState {
        router,
        user_view,
        entity_store,
        projection_processor: processor.clone(),
    });

    Ok((state, processor))
}
