//! Core value-entity trait.

use common::EntityKey;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for value entities.
///
/// A value entity is a single record addressed by a key. Unlike an
/// event-sourced aggregate it is stored as a whole: each command either
/// leaves the record alone, replaces it, or deletes it.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The type of errors command decisions on this entity can produce.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the entity type name.
    ///
    /// Used to tag stored records and committed changes.
    fn entity_type() -> &'static str;

    /// Returns the state of a key that has never been written (or was deleted).
    ///
    /// This is the state initializer: it must be deterministic for a given key.
    fn initial(key: &EntityKey) -> Self;
}
