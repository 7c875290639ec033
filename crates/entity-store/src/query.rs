use chrono::{DateTime, Utc};

use crate::{ChangeEnvelope, ChangeKind, EntityKey, Version};

/// Builder for constructing change log queries.
///
/// Allows filtering changes by key, entity type, change kind, version
/// range and time range.
#[derive(Debug, Clone, Default)]
pub struct ChangeQuery {
    /// Filter by entity key.
    pub key: Option<EntityKey>,

    /// Filter by entity type.
    pub entity_type: Option<String>,

    /// Filter by change kinds (any of these kinds).
    pub kinds: Option<Vec<ChangeKind>>,

    /// Filter by minimum version (inclusive).
    pub from_version: Option<Version>,

    /// Filter by maximum version (inclusive).
    pub to_version: Option<Version>,

    /// Filter by changes after this timestamp (inclusive).
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Filter by changes before this timestamp (inclusive).
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Maximum number of changes to return.
    pub limit: Option<usize>,

    /// Number of changes to skip.
    pub offset: Option<usize>,
}

impl ChangeQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a specific key.
    pub fn for_key(key: impl Into<EntityKey>) -> Self {
        Self {
            key: Some(key.into()),
            ..Default::default()
        }
    }

    /// Filters by entity key.
    pub fn key(mut self, key: impl Into<EntityKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Filters by entity type.
    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Filters by a single change kind.
    pub fn kind(mut self, kind: ChangeKind) -> Self {
        self.kinds = Some(vec![kind]);
        self
    }

    /// Filters to changes starting from this version (inclusive).
    pub fn from_version(mut self, version: Version) -> Self {
        self.from_version = Some(version);
        self
    }

    /// Filters to changes up to this version (inclusive).
    pub fn to_version(mut self, version: Version) -> Self {
        self.to_version = Some(version);
        self
    }

    /// Filters to changes after this timestamp (inclusive).
    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    /// Filters to changes before this timestamp (inclusive).
    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    /// Limits the number of changes returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many changes before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the change passes every filter of this query.
    ///
    /// Offset and limit are applied by the store after filtering.
    pub fn matches(&self, change: &ChangeEnvelope) -> bool {
        if let Some(ref key) = self.key
            && &change.key != key
        {
            return false;
        }
        if let Some(ref entity_type) = self.entity_type
            && &change.entity_type != entity_type
        {
            return false;
        }
        if let Some(ref kinds) = self.kinds
            && !kinds.contains(&change.kind)
        {
            return false;
        }
        if let Some(from) = self.from_version
            && change.version < from
        {
            return false;
        }
        if let Some(to) = self.to_version
            && change.version > to
        {
            return false;
        }
        if let Some(from) = self.from_timestamp
            && change.timestamp < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && change.timestamp > to
        {
            return false;
        }
        true
    }
}
