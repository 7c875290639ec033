//! User read model: one row per live user, keyed like the entity.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::EntityKey;
use domain::{DeviceId, Entity, User};
use entity_store::{ChangeEnvelope, ChangeKind, Version};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// A user as seen by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub key: EntityKey,
    pub name: String,
    pub status: String,
    pub devices: Vec<DeviceId>,
    pub device_count: usize,
    /// Entity version this row reflects.
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    fn from_user(key: EntityKey, user: User, version: Version, updated_at: DateTime<Utc>) -> Self {
        Self {
            key,
            device_count: user.devices.len(),
            name: user.name,
            status: user.status,
            devices: user.devices,
            version,
            updated_at,
        }
    }

    /// Returns the record this row mirrors.
    pub fn to_user(&self) -> User {
        User::new(&*self.name, &*self.status, self.devices.iter().cloned())
    }
}

/// Read model view of users.
///
/// Rows are replaced wholesale on every update and removed on deletion. A
/// change older than the row it targets is ignored. A user state that does
/// not decode is logged and skipped; the position still moves past it.
#[derive(Clone)]
pub struct UserView {
    rows: Arc<RwLock<HashMap<EntityKey, UserRow>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl UserView {
    /// Creates a new empty user view.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets the row for a user.
    pub async fn get_row(&self, key: &EntityKey) -> Option<UserRow> {
        self.rows.read().await.get(key).cloned()
    }

    /// Gets all rows, ordered by key.
    pub async fn all_rows(&self) -> Vec<UserRow> {
        self.collect(|_| true).await
    }

    /// Gets the users with the given status.
    pub async fn rows_by_status(&self, status: &str) -> Vec<UserRow> {
        self.collect(|row| row.status == status).await
    }

    /// Gets the users with the given name.
    pub async fn rows_by_name(&self, name: &str) -> Vec<UserRow> {
        self.collect(|row| row.name == name).await
    }

    /// Gets the users that have the device registered.
    pub async fn rows_by_device(&self, device: &DeviceId) -> Vec<UserRow> {
        self.collect(|row| row.devices.contains(device)).await
    }

    async fn collect(&self, filter: impl Fn(&UserRow) -> bool) -> Vec<UserRow> {
        let mut rows: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|row| filter(row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }
}

impl Default for UserView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for UserView {
    fn name(&self) -> &'static str {
        "UserView"
    }

    async fn handle(&self, change: &ChangeEnvelope) -> Result<()> {
        if change.entity_type == User::entity_type() {
            let mut rows = self.rows.write().await;
            let stale = rows
                .get(&change.key)
                .is_some_and(|row| row.version >= change.version);

            if !stale {
                match (change.kind, &change.state) {
                    (ChangeKind::Updated, Some(state)) => {
                        match serde_json::from_value::<User>(state.clone()) {
                            Ok(user) => {
                                rows.insert(
                                    change.key.clone(),
                                    UserRow::from_user(
                                        change.key.clone(),
                                        user,
                                        change.version,
                                        change.timestamp,
                                    ),
                                );
                            }
                            Err(e) => {
                                // The row keeps its last good state.
                                tracing::warn!(
                                    error = %e,
                                    key = %change.key,
                                    sequence = change.sequence,
                                    "skipping undecodable user state"
                                );
                                metrics::counter!(
                                    "projections_changes_skipped",
                                    "projection" => "UserView"
                                )
                                .increment(1);
                            }
                        }
                    }
                    _ => {
                        rows.remove(&change.key);
                    }
                }
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance_to(change.sequence);

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.rows.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for UserView {
    fn name(&self) -> &'static str {
        "UserView"
    }

    fn count(&self) -> usize {
        // try_read avoids blocking; a held lock reads as empty
        self.rows.try_read().map(|rows| rows.len()).unwrap_or(0)
    }
}
