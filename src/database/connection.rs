use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    config::DatabaseConfig,
    error::{AppError, Result},
};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects and brings the schema up to date with `migrations/`.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.url)
        .await?;

    let migrator = sqlx::migrate!();
    migrator
        .run(&pool)
        .await
        .map_err(|e| AppError::ConfigError(format!("Migration failed: {}", e)))?;

    tracing::info!(
        "Postgres ready ({} migrations known, pool size {})",
        migrator.iter().count(),
        config.max_connections
    );

    Ok(pool)
}

pub async fn check_health(pool: &PgPool) -> Result<()> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;

    if one != 1 {
        return Err(AppError::InternalError("Unexpected health check result".to_string()));
    }

    Ok(())
}
