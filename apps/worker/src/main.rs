//! RosterHub maintenance worker.
//!
//! Periodically purges expired or stale guard records, old request windows
//! and expired password-reset tokens. Pass `once` to run a single pass and exit.

#![forbid(unsafe_code)]

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rosterhub_application::{Clock, MaintenanceService, RateLimitService, StoreTimeout, SystemClock};
use rosterhub_core::{AppError, AppResult};
use rosterhub_infrastructure::{
    PostgresAttemptGuardRepository, PostgresRateLimitRepository, PostgresResetTokenRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkerConfig {
    database_url: String,
    cleanup_interval: Duration,
    store_timeout: StoreTimeout,
    run_once: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let maintenance_service = build_maintenance_service(pool, &config);

    if config.run_once {
        run_pass(&maintenance_service).await;
        return Ok(());
    }

    info!(
        cleanup_interval_seconds = config.cleanup_interval.as_secs(),
        "rosterhub-worker started"
    );

    let mut ticker = tokio::time::interval(config.cleanup_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        run_pass(&maintenance_service).await;
    }
}

/// A failed pass is logged and retried on the next tick.
async fn run_pass(maintenance_service: &MaintenanceService) {
    match maintenance_service.run_cleanup().await {
        Ok(report) => info!(
            guard_records = report.guard_records,
            request_windows = report.request_windows,
            reset_tokens = report.reset_tokens,
            "cleanup pass finished"
        ),
        Err(error) => warn!(error = %error, "cleanup pass failed"),
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_maintenance_service(pool: PgPool, config: &WorkerConfig) -> MaintenanceService {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let rate_limit_service = RateLimitService::new(
        Arc::new(PostgresRateLimitRepository::new(pool.clone())),
        clock.clone(),
        config.store_timeout,
    );

    MaintenanceService::new(
        Arc::new(PostgresAttemptGuardRepository::new(pool.clone())),
        rate_limit_service,
        Arc::new(PostgresResetTokenRepository::new(pool)),
        clock,
    )
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let run_once = env::args().nth(1).as_deref() == Some("once");
        Self::from_lookup(run_once, |name| env::var(name).ok())
    }

    fn from_lookup<F>(run_once: bool, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;

        let interval_seconds: u64 = parse_number(&var, "WORKER_CLEANUP_INTERVAL_SECONDS", 300)?;
        if interval_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_CLEANUP_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            cleanup_interval: Duration::from_secs(interval_seconds),
            store_timeout: StoreTimeout::from_millis(parse_number(&var, "STORE_TIMEOUT_MS", 2000)?)?,
            run_once,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_number<T, F>(var: &F, name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::WorkerConfig;

    fn load(pairs: &[(&str, &str)]) -> Result<WorkerConfig, rosterhub_core::AppError> {
        WorkerConfig::from_lookup(false, |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned())
        })
    }

    #[test]
    fn interval_defaults_to_five_minutes() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/rosterhub")])
            .unwrap_or_else(|error| panic!("config: {error}"));

        assert_eq!(config.cleanup_interval, Duration::from_secs(300));
        assert_eq!(config.store_timeout.duration(), Duration::from_millis(2000));
    }

    #[test]
    fn database_url_is_required() {
        assert!(load(&[]).is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/rosterhub"),
            ("WORKER_CLEANUP_INTERVAL_SECONDS", "0"),
        ]);
        assert!(result.is_err());
    }
}
