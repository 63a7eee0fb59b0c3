//! RosterHub API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use rosterhub_application::SystemClock;
use rosterhub_core::AppError;
use rosterhub_infrastructure::{Argon2PasswordHasher, InMemoryStore};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, RateLimitStore, StoreBackend};
use crate::api_services::StoreSet;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    if config.migrate_only {
        api_services::connect_and_migrate(
            required_database_url(&config)?,
            config.store_timeout.duration(),
        )
        .await?;
        info!("database migrations applied successfully");
        return Ok(());
    }

    let stores = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = api_services::connect_and_migrate(
                required_database_url(&config)?,
                config.store_timeout.duration(),
            )
            .await?;
            StoreSet::postgres(&pool)
        }
        StoreBackend::Memory => {
            warn!("using the in-memory store; state is lost on restart");
            StoreSet::in_memory(Arc::new(InMemoryStore::new()))
        }
    };

    let stores = match (config.rate_limit_store, config.redis_url.as_deref()) {
        (RateLimitStore::Redis, Some(redis_url)) => stores.with_rate_limit_repository(
            api_services::build_redis_rate_limit_repository(redis_url).await?,
        ),
        _ => stores,
    };

    let app_state = api_services::assemble_app_state(
        stores,
        Arc::new(SystemClock),
        Arc::new(Argon2PasswordHasher::new()),
        &config,
    )?;

    dev_seed::run(&app_state, &config).await?;

    let app = api_router::build_router(app_state);
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        runtime_mode = config.runtime_mode.as_str(),
        "rosterhub-api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn required_database_url(config: &ApiConfig) -> Result<&str, AppError> {
    config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))
}
