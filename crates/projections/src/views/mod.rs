//! Read model views.

pub mod users;

pub use users::{UserRow, UserView};
