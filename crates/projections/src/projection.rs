//! Core projection trait and position tracking.

use async_trait::async_trait;
use entity_store::ChangeEnvelope;

use crate::Result;

/// Tracks the last change sequence a projection has applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProjectionPosition {
    /// Sequence number of the last applied change (0 before any).
    pub last_sequence: u64,
}

impl ProjectionPosition {
    /// Creates a new position before the first change.
    pub fn zero() -> Self {
        Self { last_sequence: 0 }
    }

    /// Returns the position after applying the change at `sequence`.
    ///
    /// Positions never move backwards.
    pub fn advance_to(&self, sequence: u64) -> Self {
        Self {
            last_sequence: self.last_sequence.max(sequence),
        }
    }

    /// Returns true if the change at `sequence` was already applied.
    pub fn covers(&self, sequence: u64) -> bool {
        sequence <= self.last_sequence
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.last_sequence)
    }
}

/// A projection that applies committed changes to a read model.
///
/// Changes may be delivered more than once (catch-up and live delivery
/// overlap); the processor skips changes the position already covers.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Applies a single change and advances the position to its sequence.
    async fn handle(&self, change: &ChangeEnvelope) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_starts_at_zero() {
        let pos = ProjectionPosition::zero();
        assert_eq!(pos.last_sequence, 0);
        assert!(!pos.covers(1));
    }

    #[test]
    fn position_never_moves_backwards() {
        let pos = ProjectionPosition::zero().advance_to(5);
        assert_eq!(pos.advance_to(3).last_sequence, 5);
        assert!(pos.covers(5));
        assert!(!pos.covers(6));
    }

    #[test]
    fn position_display() {
        let pos = ProjectionPosition { last_sequence: 42 };
        assert_eq!(pos.to_string(), "position(42)");
    }
}
