use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    users::{
        password::{hash_password_blocking, verify_password_blocking},
        repo,
        repo_types::PublicUser,
        store::UserStore,
    },
};

pub const MAX_PAGE_SIZE: i64 = 500;
pub const MAX_USERNAME_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::InvalidInput("invalid email".into()));
    }
    Ok(email)
}

/// Reads and mutates user records through an injected [`UserStore`].
#[derive(Clone)]
pub struct UserAccessor {
    store: Arc<dyn UserStore>,
}

impl UserAccessor {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Checks `password` against the stored hash for `username`.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<PublicUser, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidInput("username is required".into()));
        }
        if password.is_empty() {
            return Err(AppError::InvalidInput("password is required".into()));
        }

        let row = self
            .store
            .fetch_users(repo::find_by_username(username))
            .await
            .map_err(|e| {
                error!(error = %e, "find_by_username failed");
                AppError::from(e)
            })?
            .into_iter()
            .next();

        let ok = verify_password_blocking(password, row.as_ref().map(|r| r.password_hash.as_str()))
            .await?;

        match row {
            Some(user) if ok => {
                info!(user_id = %user.id, "user authenticated");
                Ok(user.into())
            }
            Some(user) => {
                warn!(user_id = %user.id, "login invalid password");
                Err(AppError::InvalidCredentials)
            }
            None => {
                warn!("login unknown username");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    /// Every user, fetched with a single statement.
    #[instrument(skip(self))]
    pub async fn list_all_users(&self) -> Result<Vec<PublicUser>, AppError> {
        let rows = self.store.fetch_users(repo::list_all()).await.map_err(|e| {
            error!(error = %e, "list_all failed");
            AppError::from(e)
        })?;
        debug!(count = rows.len(), "listed users");
        Ok(rows.into_iter().map(PublicUser::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn list_users_page(&self, limit: i64, offset: i64) -> Result<Vec<PublicUser>, AppError> {
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if offset < 0 {
            return Err(AppError::InvalidInput("offset must not be negative".into()));
        }
        let rows = self
            .store
            .fetch_users(repo::list_page(limit, offset))
            .await
            .map_err(|e| {
                error!(error = %e, "list_page failed");
                AppError::from(e)
            })?;
        Ok(rows.into_iter().map(PublicUser::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<PublicUser, AppError> {
        self.store
            .fetch_users(repo::find_by_id(user_id))
            .await?
            .into_iter()
            .next()
            .map(PublicUser::from)
            .ok_or(AppError::NotFound)
    }

    /// Replaces one user's email. The address is validated before the store
    /// is touched.
    #[instrument(skip(self, new_email))]
    pub async fn update_email(&self, user_id: Uuid, new_email: &str) -> Result<(), AppError> {
        let email = normalize_email(new_email).map_err(|e| {
            warn!(%user_id, "rejected email update");
            e
        })?;

        let affected = self
            .store
            .execute(repo::update_email(user_id, &email))
            .await
            .map_err(|e| {
                error!(error = %e, %user_id, "update_email failed");
                AppError::from(e)
            })?;

        if affected == 0 {
            return Err(AppError::NotFound);
        }
        info!(%user_id, "email updated");
        Ok(())
    }

    /// Seeds a user record. Not exposed over HTTP.
    #[instrument(skip(self, email, password))]
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, AppError> {
        let username = username.trim();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "username must be 1 to {MAX_USERNAME_LEN} characters"
            )));
        }
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput("password too short".into()));
        }

        let hash = hash_password_blocking(password).await?;
        let user = self
            .store
            .fetch_users(repo::insert(username, &email, &hash))
            .await?
            .into_iter()
            .next()
            .map(PublicUser::from)
            .ok_or_else(|| AppError::Store("insert returned no row".into()))?;

        info!(user_id = %user.id, "user created");
        Ok(user)
    }
}
