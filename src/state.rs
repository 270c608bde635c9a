use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::{
    config::AppConfig,
    users::{PgUserStore, UserAccessor, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub users: UserAccessor,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.database.connect_options())
            .await
            .context("connect to database")?;
        info!(
            host = %config.database.host,
            database = %config.database.database,
            "connected to database"
        );

        let store = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        Ok(Self::from_parts(db, config, store))
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        Self {
            db,
            config,
            users: UserAccessor::new(store),
        }
    }

    #[cfg(test)]
    pub fn fake(store: Arc<dyn UserStore>) -> Self {
        use crate::config::{ConnectionDescriptor, JwtConfig};
        use secrecy::SecretString;

        let database = ConnectionDescriptor {
            host: "localhost".into(),
            port: 5432,
            username: "test".into(),
            password: SecretString::from("test".to_string()),
            database: "test".into(),
        };
        let db = PgPoolOptions::new().connect_lazy_with(database.connect_options());

        let config = Arc::new(AppConfig {
            database,
            max_connections: 1,
            acquire_timeout: std::time::Duration::from_secs(1),
            jwt: JwtConfig {
                secret: SecretString::from("test".to_string()),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            host: "127.0.0.1".into(),
            port: 0,
        });

        Self::from_parts(db, config, store)
    }
}
