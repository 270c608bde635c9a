use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod password;
pub mod query;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use repo_types::PublicUser;
pub use services::UserAccessor;
pub use store::{PgUserStore, StoreError, UserStore};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::user_routes())
}
