//! Operator endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use entity_store::EntityStore;
use projections::{Projection, ReadModel};
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct RebuildResponse {
    pub status: &'static str,
    /// Rows in the user view after the replay.
    pub user_rows: usize,
    /// Last change sequence applied to the user view.
    pub user_view_sequence: u64,
}

/// POST /admin/rebuild: resets every projection and replays the change log.
#[tracing::instrument(skip(state))]
pub async fn rebuild<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<RebuildResponse>, ApiError> {
    state
        .projection_processor
        .rebuild_all()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user_view_sequence = state.user_view.position().await.last_sequence;
    tracing::info!(user_view_sequence, "projections rebuilt");

    Ok(Json(RebuildResponse {
        status: "rebuilt",
        user_rows: ReadModel::count(&state.user_view),
        user_view_sequence,
    }))
}
