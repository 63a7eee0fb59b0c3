use std::time::Duration;

use rosterhub_core::AppError;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("../../crates/infrastructure/migrations");

/// Opens the pool and brings the schema up to date.
///
/// Waiting for a free connection is capped at `acquire_timeout` so a drained
/// pool surfaces as a store outage instead of a hung request.
pub async fn connect_and_migrate(
    database_url: &str,
    acquire_timeout: Duration,
) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Unavailable(format!("database connection failed: {error}")))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("migration failed: {error}")))?;

    info!(migrations = MIGRATOR.iter().count(), "database schema is current");
    Ok(pool)
}
