//! Shared types for the value-entity service.

pub mod types;

pub use types::EntityKey;
