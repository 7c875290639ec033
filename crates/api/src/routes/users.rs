//! User view endpoints.
//!
//! These read from the projected view, not the entity store, so a write
//! becomes visible here shortly after it is acknowledged.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::EntityKey;
use domain::DeviceId;
use entity_store::{ChangeEnvelope, EntityStore};
use projections::UserRow;
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

/// Optional filters for the user list; all given filters must match.
#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    pub status: Option<String>,
    pub name: Option<String>,
    pub device: Option<String>,
}

/// GET /users: lists user rows, optionally filtered.
#[tracing::instrument(skip(state))]
pub async fn list<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(filter): Query<UserFilter>,
) -> Json<Vec<UserRow>> {
    let view = &state.user_view;
    let device = filter.device.map(DeviceId::new);

    let mut rows = match (&filter.status, &filter.name, &device) {
        (Some(status), _, _) => view.rows_by_status(status).await,
        (None, Some(name), _) => view.rows_by_name(name).await,
        (None, None, Some(device)) => view.rows_by_device(device).await,
        (None, None, None) => view.all_rows().await,
    };

    rows.retain(|row| {
        filter.name.as_ref().is_none_or(|name| &row.name == name)
            && device.as_ref().is_none_or(|d| row.devices.contains(d))
    });

    Json(rows)
}

/// GET /users/{key}: returns one user row.
#[tracing::instrument(skip(state))]
pub async fn get<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(key): Path<String>,
) -> Result<Json<UserRow>, ApiError> {
    let key = EntityKey::new(key);
    state
        .user_view
        .get_row(&key)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User not found: {key}")))
}

/// GET /users/{key}/changes: lists every committed change for one user,
/// oldest first. Reads the entity store directly.
#[tracing::instrument(skip(state))]
pub async fn changes<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(key): Path<String>,
) -> Result<Json<Vec<ChangeEnvelope>>, ApiError> {
    let key = EntityKey::new(key);
    let changes = state
        .entity_store
        .get_changes_for_key(&key)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if changes.is_empty() {
        return Err(ApiError::NotFound(format!("User not found: {key}")));
    }

    Ok(Json(changes))
}
