//! Data access for user records over PostgreSQL, plus a small HTTP host.

pub mod app;
pub mod association;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod users;

pub use association::association_lookup;
pub use error::AppError;
pub use users::{PublicUser, UserAccessor};
