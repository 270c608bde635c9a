use std::fmt;

use uuid::Uuid;

/// A value bound to a statement placeholder.
#[derive(Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Uuid(Uuid),
    Int(i64),
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bound values can be credentials; only the kind is printed.
        match self {
            Param::Text(_) => f.write_str("Text(..)"),
            Param::Uuid(id) => write!(f, "Uuid({id})"),
            Param::Int(n) => write!(f, "Int({n})"),
        }
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_owned())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<Uuid> for Param {
    fn from(v: Uuid) -> Self {
        Param::Uuid(v)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

/// A fixed SQL template plus the values for its `$n` placeholders.
///
/// The template is `'static`, so runtime data can only reach the store
/// through [`Statement::bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: &'static str,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: &'static str) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<Param>) -> Self {
        self.params.push(value.into());
        self
    }
}
