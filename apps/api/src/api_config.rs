use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::http::HeaderName;
use chrono::TimeDelta;
use rosterhub_application::StoreTimeout;
use rosterhub_core::{AppError, TenantId};
use rosterhub_domain::{AllowedOrigins, LocalDevPolicy, RuntimeMode, TenantContext};
use tracing_subscriber::EnvFilter;

/// Backend holding tenants, users, guard counters and reset tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Backend for the coarse per-tenant request limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStore {
    /// Same store as everything else.
    Primary,
    Redis,
}

#[derive(Debug, Clone)]
pub struct DevSeedUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub runtime_mode: RuntimeMode,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub rate_limit_store: RateLimitStore,
    pub redis_url: Option<String>,
    pub session_secret: String,
    pub session_ttl: TimeDelta,
    pub api_host: String,
    pub api_port: u16,
    pub api_key_header: HeaderName,
    pub admin_token: Option<String>,
    pub frontend_url: String,
    pub dev_tenant: TenantContext,
    pub local_dev_policy: LocalDevPolicy,
    pub store_timeout: StoreTimeout,
    pub dev_seed_user: Option<DevSeedUser>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(migrate_only: bool, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let runtime_mode = RuntimeMode::parse(
            var("RUNTIME_MODE")
                .as_deref()
                .unwrap_or(RuntimeMode::Production.as_str()),
        )?;

        let store_backend = match var("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "STORE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        if store_backend == StoreBackend::Memory && runtime_mode.is_production() {
            return Err(AppError::Validation(
                "STORE_BACKEND=memory is not allowed in production".to_owned(),
            ));
        }

        let database_url = var("DATABASE_URL");
        if (store_backend == StoreBackend::Postgres || migrate_only) && database_url.is_none() {
            return Err(AppError::Validation("DATABASE_URL is required".to_owned()));
        }

        let rate_limit_store = match var("RATE_LIMIT_STORE").as_deref() {
            None | Some("primary") => RateLimitStore::Primary,
            Some("postgres") if store_backend == StoreBackend::Postgres => RateLimitStore::Primary,
            Some("memory") if store_backend == StoreBackend::Memory => RateLimitStore::Primary,
            Some("redis") => RateLimitStore::Redis,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "RATE_LIMIT_STORE must be 'redis' or match STORE_BACKEND, got '{other}'"
                )));
            }
        };

        let redis_url = var("REDIS_URL");
        if rate_limit_store == RateLimitStore::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when RATE_LIMIT_STORE=redis".to_owned(),
            ));
        }

        let session_secret = var("SESSION_SECRET")
            .ok_or_else(|| AppError::Validation("SESSION_SECRET is required".to_owned()))?;
        let session_ttl = TimeDelta::minutes(parse_number(&var, "SESSION_TTL_MINUTES", 720)?);

        let api_port = parse_number(&var, "API_PORT", 3001)?;
        let api_key_header = HeaderName::from_str(
            var("API_KEY_HEADER")
                .as_deref()
                .unwrap_or("x-api-key")
                .trim(),
        )
        .map_err(|error| AppError::Validation(format!("invalid API_KEY_HEADER: {error}")))?;

        let store_timeout = StoreTimeout::from_millis(parse_number(&var, "STORE_TIMEOUT_MS", 2000)?)?;

        let dev_tenant = TenantContext::new(
            TenantId::parse(var("DEV_TENANT_ID").unwrap_or_else(|| "dev".to_owned()))?,
            var("DEV_TENANT_NAME").unwrap_or_else(|| "Local Development".to_owned()),
            AllowedOrigins::new(
                var("DEV_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| "http://localhost:3000".to_owned())
                    .split(','),
            )?,
            parse_number(&var, "DEV_REQUESTS_PER_MINUTE", 600)?,
        )?;

        let local_dev_policy = match var("DEV_LOCAL_NETWORKS") {
            Some(networks) => LocalDevPolicy::parse_networks(&networks)?,
            None => LocalDevPolicy::default(),
        };

        let dev_seed_user = match (var("DEV_SEED_USER_EMAIL"), var("DEV_SEED_USER_PASSWORD")) {
            (Some(email), Some(password)) => Some(DevSeedUser { email, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "DEV_SEED_USER_EMAIL and DEV_SEED_USER_PASSWORD must be set together"
                        .to_owned(),
                ));
            }
        };

        Ok(Self {
            migrate_only,
            runtime_mode,
            store_backend,
            database_url,
            rate_limit_store,
            redis_url,
            session_secret,
            session_ttl,
            api_host: var("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned()),
            api_port,
            api_key_header,
            admin_token: var("ADMIN_TOKEN"),
            frontend_url: var("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_owned()),
            dev_tenant,
            local_dev_policy,
            store_timeout,
            dev_seed_user,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_number<T, F>(var: &F, name: &str, default: T) -> Result<T, AppError>
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
