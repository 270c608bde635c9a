use async_trait::async_trait;
use sqlx::{
    postgres::PgArguments,
    query::{Query, QueryAs},
    PgPool, Postgres,
};
use thiserror::Error;
use tracing::{debug, error};

use crate::users::{
    query::{Param, Statement},
    repo_types::UserRow,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("constraint violated: {0}")]
    Conflict(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Query(e.to_string()),
        }
    }
}

impl StoreError {
    /// Any failure to get a connection, including the server refusing the
    /// login or not knowing the database, means the store is unreachable.
    pub fn on_acquire(e: sqlx::Error) -> Self {
        error!(error = %e, "acquire connection failed");
        StoreError::Unavailable(e.to_string())
    }
}

/// Parameterized access to the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn fetch_users(&self, stmt: Statement) -> Result<Vec<UserRow>, StoreError>;
    /// Runs a statement and returns the number of rows it affected.
    async fn execute(&self, stmt: Statement) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_rows(stmt: Statement) -> QueryAs<'static, Postgres, UserRow, PgArguments> {
    stmt.params
        .into_iter()
        .fold(sqlx::query_as::<_, UserRow>(stmt.sql), |q, p| match p {
            Param::Text(v) => q.bind(v),
            Param::Uuid(v) => q.bind(v),
            Param::Int(v) => q.bind(v),
        })
}

fn bind_exec(stmt: Statement) -> Query<'static, Postgres, PgArguments> {
    stmt.params
        .into_iter()
        .fold(sqlx::query(stmt.sql), |q, p| match p {
            Param::Text(v) => q.bind(v),
            Param::Uuid(v) => q.bind(v),
            Param::Int(v) => q.bind(v),
        })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn fetch_users(&self, stmt: Statement) -> Result<Vec<UserRow>, StoreError> {
        // Connection goes back to the pool when `conn` drops, on every path.
        let mut conn = self.pool.acquire().await.map_err(StoreError::on_acquire)?;
        let rows = bind_rows(stmt).fetch_all(&mut *conn).await?;
        debug!(rows = rows.len(), "fetched users");
        Ok(rows)
    }

    async fn execute(&self, stmt: Statement) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::on_acquire)?;
        let done = bind_exec(stmt).execute(&mut *conn).await?;
        Ok(done.rows_affected())
    }
}
