use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EntityKey;

/// Unique identifier for a committed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(Uuid);

impl ChangeId {
    /// Creates a new random change ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a change ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version number of an entity, used for optimistic concurrency control.
///
/// Version 0 means the key has never been written. The first commit
/// produces version 1 and each later commit (deletions included) adds one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) of a never-written key.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) produced by the first commit.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// What a committed change did to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The record was created or replaced.
    Updated,
    /// The record was removed.
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Updated => "Updated",
            ChangeKind::Deleted => "Deleted",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed change to one entity, with the metadata projections need.
///
/// `sequence` is the position of the change in the store-wide change log.
/// It is assigned by the store at commit time; whatever the caller sets is
/// overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    /// Unique identifier for this change.
    pub change_id: ChangeId,

    /// Position in the store-wide change log (1-based).
    pub sequence: u64,

    /// The type of entity (e.g., "User").
    pub entity_type: String,

    /// The entity this change belongs to.
    pub key: EntityKey,

    /// The version of the entity after this change.
    pub version: Version,

    /// Whether the record was replaced or removed.
    pub kind: ChangeKind,

    /// The full record after the change. `None` for deletions.
    pub state: Option<serde_json::Value>,

    /// When the change was created.
    pub timestamp: DateTime<Utc>,

    /// Additional metadata about the change.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChangeEnvelope {
    /// Creates a new change envelope builder.
    pub fn builder() -> ChangeEnvelopeBuilder {
        ChangeEnvelopeBuilder::default()
    }

    /// Returns true if this change removed the record.
    pub fn is_deletion(&self) -> bool {
        self.kind == ChangeKind::Deleted
    }
}

/// Builder for constructing change envelopes.
#[derive(Debug, Default)]
pub struct ChangeEnvelopeBuilder {
    change_id: Option<ChangeId>,
    entity_type: Option<String>,
    key: Option<EntityKey>,
    version: Option<Version>,
    kind: Option<ChangeKind>,
    timestamp: Option<DateTime<Utc>>,
    state: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl ChangeEnvelopeBuilder {
    /// Sets the change ID. If not set, a new ID will be generated.
    pub fn change_id(mut self, id: ChangeId) -> Self {
        self.change_id = Some(id);
        self
    }

    /// Sets the entity type.
    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Sets the entity key.
    pub fn key(mut self, key: impl Into<EntityKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the version the entity will have after this change.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the timestamp. If not set, the current time will be used.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Marks the change as a replacement with the given serializable state.
    pub fn state<T: Serialize>(mut self, state: &T) -> Result<Self, serde_json::Error> {
        self.state = Some(serde_json::to_value(state)?);
        self.kind = Some(ChangeKind::Updated);
        Ok(self)
    }

    /// Marks the change as a replacement with a raw JSON state.
    pub fn state_raw(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self.kind = Some(ChangeKind::Updated);
        self
    }

    /// Marks the change as a deletion.
    pub fn deleted(mut self) -> Self {
        self.state = None;
        self.kind = Some(ChangeKind::Deleted);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the change envelope.
    ///
    /// # Panics
    ///
    /// Panics if required fields (entity_type, key, version, and either a
    /// state or a deletion marker) are not set.
    pub fn build(self) -> ChangeEnvelope {
        ChangeEnvelope {
            change_id: self.change_id.unwrap_or_default(),
            sequence: 0,
            entity_type: self.entity_type.expect("entity_type is required"),
            key: self.key.expect("key is required"),
            version: self.version.expect("version is required"),
            kind: self.kind.expect("state or deletion is required"),
            state: self.state,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            metadata: self.metadata,
        }
    }

    /// Tries to build the change envelope, returning None if required fields are missing.
    pub fn try_build(self) -> Option<ChangeEnvelope> {
        Some(ChangeEnvelope {
            change_id: self.change_id.unwrap_or_default(),
            sequence: 0,
            entity_type: self.entity_type?,
            key: self.key?,
            version: self.version?,
            kind: self.kind?,
            state: self.state,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_id_new_creates_unique_ids() {
        let id1 = ChangeId::new();
        let id2 = ChangeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn version_ordering() {
        let v1 = Version::new(1);
        let v2 = Version::new(2);
        assert!(v1 < v2);
        assert_eq!(v1.next(), v2);
    }

    #[test]
    fn version_initial_and_first() {
        assert_eq!(Version::initial().as_i64(), 0);
        assert_eq!(Version::first().as_i64(), 1);
        assert_eq!(Version::initial().next(), Version::first());
    }

    #[test]
    fn change_envelope_builder_update() {
        let state = serde_json::json!({"name": "A", "status": "active"});

        let change = ChangeEnvelope::builder()
            .entity_type("User")
            .key("u1")
            .version(Version::first())
            .state_raw(state.clone())
            .metadata("command", serde_json::json!("CreateUser"))
            .build();

        assert_eq!(change.entity_type, "User");
        assert_eq!(change.key, EntityKey::new("u1"));
        assert_eq!(change.version, Version::first());
        assert_eq!(change.kind, ChangeKind::Updated);
        assert_eq!(change.state, Some(state));
        assert_eq!(change.sequence, 0);
        assert_eq!(
            change.metadata.get("command"),
            Some(&serde_json::json!("CreateUser"))
        );
    }

    #[test]
    fn change_envelope_builder_deletion_drops_state() {
        let change = ChangeEnvelope::builder()
            .entity_type("User")
            .key("u1")
            .version(Version::new(3))
            .state_raw(serde_json::json!({"name": "A"}))
            .deleted()
            .build();

        assert!(change.is_deletion());
        assert!(change.state.is_none());
    }

    #[test]
    fn change_envelope_try_build_returns_none_on_missing_fields() {
        assert!(ChangeEnvelope::builder().try_build().is_none());

        let missing_kind = ChangeEnvelope::builder()
            .entity_type("User")
            .key("u1")
            .version(Version::first())
            .try_build();
        assert!(missing_kind.is_none());
    }
}
