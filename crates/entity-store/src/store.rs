use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use tokio::sync::broadcast;

use crate::{
    ChangeEnvelope, ChangeKind, ChangeQuery, EntityKey, EntityStoreError, Result, StoredRecord,
    Version,
};

/// Options for committing a change to the store.
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Expected current version of the entity for optimistic concurrency control.
    /// If None, only the change's own version is checked (use with caution).
    pub expected_version: Option<Version>,
}

impl CommitOptions {
    /// Creates options with no expected-version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the entity to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the key to never have been written.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// A stream of committed changes.
pub type ChangeStream = Pin<Box<dyn Stream<Item = Result<ChangeEnvelope>> + Send>>;

/// Core trait for entity store implementations.
///
/// A store holds one committed record per key and a log of every commit.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Returns the latest committed record for a key, tombstones included.
    ///
    /// Returns None if the key has never been written.
    async fn get(&self, key: &EntityKey) -> Result<Option<StoredRecord>>;

    /// Commits a change to the store.
    ///
    /// The commit is atomic: readers observe either the previous record or
    /// the new one, never a mix. If `options.expected_version` is set and does
    /// not match the committed version, the commit fails with `WriteConflict`.
    /// The change's own version must be exactly one above the committed one.
    ///
    /// Returns the new version of the entity.
    async fn commit(&self, change: ChangeEnvelope, options: CommitOptions) -> Result<Version>;

    /// Gets the committed version of a key.
    ///
    /// Returns None if the key has never been written.
    async fn get_version(&self, key: &EntityKey) -> Result<Option<Version>>;

    /// Retrieves all changes for a key in version order.
    async fn get_changes_for_key(&self, key: &EntityKey) -> Result<Vec<ChangeEnvelope>>;

    /// Retrieves every change with a sequence number above `sequence`.
    ///
    /// Changes are returned in sequence order.
    async fn changes_after(&self, sequence: u64) -> Result<Vec<ChangeEnvelope>>;

    /// Retrieves changes matching a query.
    async fn query_changes(&self, query: ChangeQuery) -> Result<Vec<ChangeEnvelope>>;

    /// Streams all changes in the store in sequence order.
    async fn stream_all_changes(&self) -> Result<ChangeStream>;

    /// Subscribes to changes committed from now on.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEnvelope>;
}

/// Extension trait providing convenience methods for entity stores.
#[async_trait]
pub trait EntityStoreExt: EntityStore {
    /// Checks if a key holds a live (non-deleted) record.
    async fn exists(&self, key: &EntityKey) -> Result<bool> {
        Ok(self
            .get(key)
            .await?
            .is_some_and(|record| !record.is_deleted()))
    }
}

// Blanket implementation for all EntityStore implementations
impl<T: EntityStore + ?Sized> EntityStoreExt for T {}

/// Validates a change before committing.
pub fn validate_change_for_commit(change: &ChangeEnvelope) -> Result<()> {
    if change.key.is_blank() {
        return Err(EntityStoreError::InvalidChange(
            "Entity key must not be blank".to_string(),
        ));
    }

    if change.version < Version::first() {
        return Err(EntityStoreError::InvalidChange(format!(
            "Change version must be at least {}, got {}",
            Version::first(),
            change.version
        )));
    }

    match (change.kind, &change.state) {
        (ChangeKind::Updated, None) => Err(EntityStoreError::InvalidChange(
            "Updated change must carry a state".to_string(),
        )),
        (ChangeKind::Deleted, Some(_)) => Err(EntityStoreError::InvalidChange(
            "Deleted change must not carry a state".to_string(),
        )),
        _ => Ok(()),
    }
}
