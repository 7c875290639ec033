//! Read views for the query side of the value-entity service.
//!
//! This crate turns committed entity changes into query rows:
//! - [`Projection`] trait for applying changes to a read model
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for feeding changes from the store to projections,
//!   either on demand or from a live subscription
//! - [`UserView`], the user rows keyed like the entities they mirror

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{UserRow, UserView};
