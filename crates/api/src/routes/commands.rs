//! Command dispatch endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::HandlerKind;
use entity_store::EntityStore;
use serde::Serialize;
use serde_json::Value;

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub kind: HandlerKind,
}

/// GET /commands: lists registered command names and their kinds.
pub async fn list<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<CommandInfo>> {
    let commands = state
        .router
        .commands()
        .into_iter()
        .map(|(name, kind)| CommandInfo { name, kind })
        .collect();
    Json(commands)
}

/// POST /commands/{name}: dispatches any registered command.
#[tracing::instrument(skip(state, payload))]
pub async fn dispatch<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(name): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let reply = state.router.dispatch(&name, payload).await?;
    Ok(Json(reply))
}

/// POST /queries/{name}: dispatches a read-only command.
#[tracing::instrument(skip(state, payload))]
pub async fn query<S: EntityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(name): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let reply = state.router.dispatch_query(&name, payload).await?;
    Ok(Json(reply))
}
