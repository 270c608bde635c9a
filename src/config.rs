use std::time::Duration;

use anyhow::{anyhow, Context};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgConnectOptions;

/// Where the user store lives. The password only ever comes from the
/// environment or a mounted secret file.
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub database: String,
}

impl ConnectionDescriptor {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .database(&self.database)
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: ConnectionDescriptor,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} is not set"));
        let parsed = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(v) => v.parse::<u64>().with_context(|| format!("{key} must be a number")),
                None => Ok(default),
            }
        };

        let password = match lookup("DB_PASSWORD_FILE") {
            Some(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("read DB_PASSWORD_FILE {path}"))?
                .trim_end_matches(['\r', '\n'])
                .to_string(),
            None => required("DB_PASSWORD")?,
        };

        let database = ConnectionDescriptor {
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: u16::try_from(parsed("DB_PORT", 5432)?).context("DB_PORT out of range")?,
            username: required("DB_USER")?,
            password: SecretString::from(password),
            database: required("DB_NAME")?,
        };

        let jwt = JwtConfig {
            secret: SecretString::from(required("JWT_SECRET")?),
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "user-records".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "user-records-clients".into()),
            ttl_minutes: i64::try_from(parsed("JWT_TTL_MINUTES", 60)?)
                .context("JWT_TTL_MINUTES out of range")?,
        };

        let max_connections = u32::try_from(parsed("DB_MAX_CONNECTIONS", 10)?)
            .context("DB_MAX_CONNECTIONS out of range")?;
        anyhow::ensure!(max_connections > 0, "DB_MAX_CONNECTIONS must be at least 1");

        Ok(Self {
            database,
            max_connections,
            acquire_timeout: Duration::from_secs(parsed("DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            jwt,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: u16::try_from(parsed("APP_PORT", 8080)?).context("APP_PORT out of range")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DB_USER", "app"),
        ("DB_PASSWORD", "s3cret"),
        ("DB_NAME", "users"),
        ("JWT_SECRET", "jwt-secret"),
    ];

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(lookup_from(BASE)).unwrap();
        assert_eq!(cfg.database.host, "localhost");
        assert_eq!(cfg.database.port, 5432);
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn password_is_required() {
        let pairs: Vec<_> = BASE
            .iter()
            .copied()
            .filter(|(k, _)| *k != "DB_PASSWORD")
            .collect();
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("DB_PASSWORD"));
    }

    #[test]
    fn password_file_takes_precedence() {
        let path = std::env::temp_dir().join(format!("db-pw-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, "from-file\n").unwrap();
        let path_str = path.to_string_lossy().to_string();

        let mut pairs = BASE.to_vec();
        pairs.push(("DB_PASSWORD_FILE", &path_str));
        let cfg = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.database.password.expose_secret(), "from-file");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn debug_never_prints_secrets() {
        let cfg = AppConfig::from_lookup(lookup_from(BASE)).unwrap();
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("jwt-secret"));
    }

    #[test]
    fn pool_size_must_fit_and_be_positive() {
        for bad in ["0", "4294967296"] {
            let mut pairs = BASE.to_vec();
            pairs.push(("DB_MAX_CONNECTIONS", bad));
            let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains("DB_MAX_CONNECTIONS"), "{bad}: {err}");
        }
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut pairs = BASE.to_vec();
        pairs.push(("DB_PORT", "not-a-port"));
        assert!(AppConfig::from_lookup(lookup_from(&pairs)).is_err());
    }
}
