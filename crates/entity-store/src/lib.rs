//! Versioned value-entity storage.
//!
//! Each key holds exactly one committed record. Commits carry the version
//! they expect to replace, so a stale writer is rejected with
//! [`EntityStoreError::WriteConflict`] instead of overwriting a newer record.
//! Every commit is also appended to a change log that projections consume.

pub mod change;
pub mod error;
pub mod memory;
pub mod query;
pub mod record;
pub mod store;

pub use change::{ChangeEnvelope, ChangeEnvelopeBuilder, ChangeId, ChangeKind, Version};
pub use common::EntityKey;
pub use error::{EntityStoreError, Result};
pub use memory::InMemoryEntityStore;
pub use query::ChangeQuery;
pub use record::StoredRecord;
pub use store::{ChangeStream, CommitOptions, EntityStore, EntityStoreExt};
