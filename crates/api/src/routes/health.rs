//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use entity_store::EntityStore;
use projections::Projection;
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of registered command names.
    pub commands: usize,
    /// Last change sequence applied to the user view.
    pub user_view_sequence: u64,
}

/// GET /health: returns system health status.
pub async fn check<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        commands: state.router.len(),
        user_view_sequence: state.user_view.position().await.last_sequence,
    })
}
