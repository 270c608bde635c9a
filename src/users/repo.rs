//! Statements issued against the `users` table.

use uuid::Uuid;

use crate::users::query::Statement;

pub const FIND_BY_USERNAME: &str = r#"
    SELECT id, username, email, password_hash, created_at
    FROM users
    WHERE username = $1
"#;

pub const FIND_BY_ID: &str = r#"
    SELECT id, username, email, password_hash, created_at
    FROM users
    WHERE id = $1
"#;

pub const LIST_ALL: &str = r#"
    SELECT id, username, email, password_hash, created_at
    FROM users
    ORDER BY created_at, id
"#;

pub const LIST_PAGE: &str = r#"
    SELECT id, username, email, password_hash, created_at
    FROM users
    ORDER BY created_at, id
    LIMIT $1 OFFSET $2
"#;

pub const UPDATE_EMAIL: &str = r#"
    UPDATE users
    SET email = $1
    WHERE id = $2
"#;

pub const INSERT: &str = r#"
    INSERT INTO users (username, email, password_hash)
    VALUES ($1, $2, $3)
    RETURNING id, username, email, password_hash, created_at
"#;

pub fn find_by_username(username: &str) -> Statement {
    Statement::new(FIND_BY_USERNAME).bind(username)
}

pub fn find_by_id(id: Uuid) -> Statement {
    Statement::new(FIND_BY_ID).bind(id)
}

pub fn list_all() -> Statement {
    Statement::new(LIST_ALL)
}

pub fn list_page(limit: i64, offset: i64) -> Statement {
    Statement::new(LIST_PAGE).bind(limit).bind(offset)
}

/// Single-row update; atomic on its own.
pub fn update_email(id: Uuid, email: &str) -> Statement {
    Statement::new(UPDATE_EMAIL).bind(email).bind(id)
}

pub fn insert(username: &str, email: &str, password_hash: &str) -> Statement {
    Statement::new(INSERT)
        .bind(username)
        .bind(email)
        .bind(password_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::query::Param;

    #[test]
    fn hostile_username_stays_out_of_sql() {
        let hostile = "' OR '1'='1";
        let stmt = find_by_username(hostile);
        assert!(!stmt.sql.contains(hostile));
        assert_eq!(stmt.params, vec![Param::Text(hostile.into())]);
    }

    #[test]
    fn update_email_binds_email_then_id() {
        let id = Uuid::new_v4();
        let stmt = update_email(id, "a@b.com");
        assert_eq!(
            stmt.params,
            vec![Param::Text("a@b.com".into()), Param::Uuid(id)]
        );
    }
}
