use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use crate::{
    ChangeEnvelope, ChangeQuery, EntityKey, EntityStoreError, Result, StoredRecord, Version,
    store::{ChangeStream, CommitOptions, EntityStore, validate_change_for_commit},
};

/// Default number of changes a slow subscriber may fall behind before it lags.
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 1024;

#[derive(Default)]
struct Inner {
    records: HashMap<EntityKey, StoredRecord>,
    changes: Vec<ChangeEnvelope>,
}

/// In-memory entity store.
///
/// Records and the change log live behind a single lock, so a commit
/// replaces the record and appends its change in one step.
#[derive(Clone)]
pub struct InMemoryEntityStore {
    inner: Arc<RwLock<Inner>>,
    changes_tx: broadcast::Sender<ChangeEnvelope>,
}

impl InMemoryEntityStore {
    /// Creates a new empty in-memory entity store.
    pub fn new() -> Self {
        Self::with_subscription_capacity(DEFAULT_SUBSCRIPTION_CAPACITY)
    }

    /// Creates a store whose subscribers may buffer up to `capacity` changes.
    pub fn with_subscription_capacity(capacity: usize) -> Self {
        let (changes_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            changes_tx,
        }
    }

    /// Returns the total number of committed changes.
    pub async fn change_count(&self) -> usize {
        self.inner.read().await.changes.len()
    }

    /// Returns the number of keys holding a live record.
    pub async fn key_count(&self) -> usize {
        self.inner
            .read()
            .await
            .records
            .values()
            .filter(|r| !r.is_deleted())
            .count()
    }

    /// Clears all records and changes. Sequences restart at 1 and
    /// subscribers are not told, so projections fed by this store must be
    /// reset alongside it.
    #[cfg(test)]
    pub(crate) async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.records.clear();
        inner.changes.clear();
    }
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get(&self, key: &EntityKey) -> Result<Option<StoredRecord>> {
        Ok(self.inner.read().await.records.get(key).cloned())
    }

    #[tracing::instrument(skip(self, change, options), fields(key = %change.key, version = %change.version))]
    async fn commit(&self, mut change: ChangeEnvelope, options: CommitOptions) -> Result<Version> {
        validate_change_for_commit(&change)?;

        let key = change.key.clone();
        let mut inner = self.inner.write().await;

        let existing = inner.records.get(&key);
        if let Some(record) = existing
            && record.entity_type != change.entity_type
        {
            return Err(EntityStoreError::InvalidChange(format!(
                "Key {key} holds a {} entity, not {}",
                record.entity_type, change.entity_type
            )));
        }
        let current_version = existing.map(|r| r.version).unwrap_or(Version::initial());

        // Check expected version if specified
        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            metrics::counter!("entity_store_write_conflicts_total").increment(1);
            tracing::debug!(%expected, actual = %current_version, "write conflict");
            return Err(EntityStoreError::WriteConflict {
                key,
                expected,
                actual: current_version,
            });
        }

        // The change must have been built on top of the committed version
        if change.version != current_version.next() {
            metrics::counter!("entity_store_write_conflicts_total").increment(1);
            tracing::debug!(actual = %current_version, "stale change version");
            return Err(EntityStoreError::WriteConflict {
                key,
                expected: Version::new(change.version.as_i64() - 1),
                actual: current_version,
            });
        }

        change.sequence = inner.changes.len() as u64 + 1;
        let new_version = change.version;

        inner
            .records
            .insert(key, StoredRecord::from_change(&change));
        inner.changes.push(change.clone());

        // Sent under the lock so subscribers see commits in sequence order.
        // An error only means nobody is subscribed.
        let _ = self.changes_tx.send(change);

        metrics::counter!("entity_store_commits_total").increment(1);

        Ok(new_version)
    }

    async fn get_version(&self, key: &EntityKey) -> Result<Option<Version>> {
        Ok(self.inner.read().await.records.get(key).map(|r| r.version))
    }

    async fn get_changes_for_key(&self, key: &EntityKey) -> Result<Vec<ChangeEnvelope>> {
        let inner = self.inner.read().await;
        let mut changes: Vec<_> = inner
            .changes
            .iter()
            .filter(|c| &c.key == key)
            .cloned()
            .collect();
        changes.sort_by_key(|c| c.version);
        Ok(changes)
    }

    async fn changes_after(&self, sequence: u64) -> Result<Vec<ChangeEnvelope>> {
        let inner = self.inner.read().await;
        // Sequence n lives at index n - 1.
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(inner.changes.len());
        Ok(inner.changes[start..].to_vec())
    }

    async fn query_changes(&self, query: ChangeQuery) -> Result<Vec<ChangeEnvelope>> {
        let inner = self.inner.read().await;
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);

        let changes = inner
            .changes
            .iter()
            .filter(|c| query.matches(c))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(changes)
    }

    async fn stream_all_changes(&self) -> Result<ChangeStream> {
        use futures_util::stream;

        let changes = self.inner.read().await.changes.clone();
        let stream = stream::iter(changes.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEnvelope> {
        self.changes_tx.subscribe()
    }
}
