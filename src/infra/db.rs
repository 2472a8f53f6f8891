use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::AppConfig;

/// Postgres error code raised on unique constraint violations.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.db_idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.db_max_lifetime_seconds))
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Name of the unique constraint an error violated, if that is what it is.
pub fn unique_violation(err: &anyhow::Error) -> Option<String> {
    let sqlx_err = err.downcast_ref::<sqlx::Error>()?;
    let db_err = sqlx_err.as_database_error()?;
    if db_err.code()? != UNIQUE_VIOLATION {
        return None;
    }
    Some(db_err.constraint().unwrap_or_default().to_string())
}
