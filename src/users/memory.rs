//! In-memory `UserStore` that records every statement it receives.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{
    query::{Param, Statement},
    repo,
    repo_types::UserRow,
    store::{StoreError, UserStore},
};

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<UserRow>>,
    calls: Mutex<Vec<Statement>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn calls(&self) -> Vec<Statement> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn insert_many(&self, n: usize) {
        let mut rows = self.rows.lock().unwrap();
        for i in 0..n {
            rows.push(UserRow {
                id: Uuid::new_v4(),
                username: format!("user{i}"),
                email: format!("user{i}@example.com"),
                password_hash: "unused".into(),
                created_at: OffsetDateTime::now_utc(),
            });
        }
    }

    fn enter(&self, stmt: &Statement) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(stmt.clone());
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

fn text(p: Option<&Param>) -> Result<&str, StoreError> {
    match p {
        Some(Param::Text(v)) => Ok(v),
        other => Err(StoreError::Query(format!("expected text, got {other:?}"))),
    }
}

fn uuid(p: Option<&Param>) -> Result<Uuid, StoreError> {
    match p {
        Some(Param::Uuid(v)) => Ok(*v),
        other => Err(StoreError::Query(format!("expected uuid, got {other:?}"))),
    }
}

fn int(p: Option<&Param>) -> Result<i64, StoreError> {
    match p {
        Some(Param::Int(v)) => Ok(*v),
        other => Err(StoreError::Query(format!("expected int, got {other:?}"))),
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn fetch_users(&self, stmt: Statement) -> Result<Vec<UserRow>, StoreError> {
        self.enter(&stmt)?;
        let p = &stmt.params;
        let mut rows = self.rows.lock().unwrap();
        match stmt.sql {
            repo::FIND_BY_USERNAME => {
                let username = text(p.first())?;
                Ok(rows.iter().filter(|r| r.username == username).cloned().collect())
            }
            repo::FIND_BY_ID => {
                let id = uuid(p.first())?;
                Ok(rows.iter().filter(|r| r.id == id).cloned().collect())
            }
            repo::LIST_ALL => Ok(rows.clone()),
            repo::LIST_PAGE => {
                let limit = int(p.first())? as usize;
                let offset = int(p.get(1))? as usize;
                Ok(rows.iter().skip(offset).take(limit).cloned().collect())
            }
            repo::INSERT => {
                let username = text(p.first())?;
                if rows.iter().any(|r| r.username == username) {
                    return Err(StoreError::Conflict("users_username_key".into()));
                }
                let row = UserRow {
                    id: Uuid::new_v4(),
                    username: username.to_owned(),
                    email: text(p.get(1))?.to_owned(),
                    password_hash: text(p.get(2))?.to_owned(),
                    created_at: OffsetDateTime::now_utc(),
                };
                rows.push(row.clone());
                Ok(vec![row])
            }
            other => Err(StoreError::Query(format!("unexpected statement: {other}"))),
        }
    }

    async fn execute(&self, stmt: Statement) -> Result<u64, StoreError> {
        self.enter(&stmt)?;
        let p = &stmt.params;
        match stmt.sql {
            repo::UPDATE_EMAIL => {
                let email = text(p.first())?;
                let id = uuid(p.get(1))?;
                let mut rows = self.rows.lock().unwrap();
                let mut affected = 0;
                for row in rows.iter_mut().filter(|r| r.id == id) {
                    row.email = email.to_owned();
                    affected += 1;
                }
                Ok(affected)
            }
            other => Err(StoreError::Query(format!("unexpected statement: {other}"))),
        }
    }
}
