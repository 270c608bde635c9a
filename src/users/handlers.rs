use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{AuthUser, JwtKeys},
    error::AppError,
    state::AppState,
    users::{
        dto::{AuthResponse, LoginRequest, Pagination, UpdateEmailRequest},
        repo_types::PublicUser,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/email", put(update_my_email))
        .route("/users", get(list_users))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .authenticate(&payload.username, &payload.password)
        .await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse { access_token, user }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    Ok(Json(state.users.get_user(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_my_email(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateEmailRequest>,
) -> Result<StatusCode, AppError> {
    state.users.update_email(user_id, &payload.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = match (p.limit, p.offset) {
        (Some(limit), offset) => {
            state
                .users
                .list_users_page(limit, offset.unwrap_or(0))
                .await?
        }
        (None, Some(_)) => {
            return Err(AppError::InvalidInput("offset requires limit".into()));
        }
        (None, None) => state.users.list_all_users().await?,
    };
    Ok(Json(users))
}
