use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChangeEnvelope, EntityKey, Version};

/// The latest committed state of one key.
///
/// A deleted entity keeps its slot as a tombstone so that versions keep
/// growing if the key is written again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// The key this record belongs to.
    pub key: EntityKey,

    /// The type of entity (e.g., "User").
    pub entity_type: String,

    /// The committed version.
    pub version: Version,

    /// The committed record. `None` once the entity has been deleted.
    pub state: Option<serde_json::Value>,

    /// When the committed change was created.
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Builds the stored record a committed change leaves behind.
    pub fn from_change(change: &ChangeEnvelope) -> Self {
        Self {
            key: change.key.clone(),
            entity_type: change.entity_type.clone(),
            version: change.version,
            state: change.state.clone(),
            updated_at: change.timestamp,
        }
    }

    /// Returns true if the entity has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.state.is_none()
    }

    /// Deserializes the committed record into a typed value.
    ///
    /// Returns `Ok(None)` for tombstones.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.state
            .as_ref()
            .map(|state| serde_json::from_value(state.clone()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_from_update_change() {
        let change = ChangeEnvelope::builder()
            .entity_type("User")
            .key("u1")
            .version(Version::new(2))
            .state_raw(serde_json::json!({"name": "B"}))
            .build();

        let record = StoredRecord::from_change(&change);
        assert_eq!(record.version, Version::new(2));
        assert!(!record.is_deleted());
        assert_eq!(record.updated_at, change.timestamp);
    }

    #[test]
    fn record_from_deletion_is_tombstone() {
        let change = ChangeEnvelope::builder()
            .entity_type("User")
            .key("u1")
            .version(Version::new(3))
            .deleted()
            .build();

        let record = StoredRecord::from_change(&change);
        assert!(record.is_deleted());
        let decoded: Option<serde_json::Value> = record.decode().unwrap();
        assert!(decoded.is_none());
    }
}
