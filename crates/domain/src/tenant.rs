//! Tenant context and origin rules.
//!
//! A `TenantContext` is resolved once per request and handed to every
//! component that touches tenant-scoped data. It is an immutable value; the
//! pipeline never mutates it after resolution.

use std::collections::BTreeSet;
use std::net::IpAddr;

use ipnet::IpNet;
use rosterhub_core::{AppError, AppResult, TenantId};
use serde_json::Value;
use url::{Host, Url};

/// Process-wide runtime mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Local development. Enables the loopback tenant fallback.
    Development,
    /// Production. Every request must carry an API key.
    Production,
}

impl RuntimeMode {
    /// Parses a configuration value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(AppError::Validation(format!(
                "RUNTIME_MODE must be 'development' or 'production', got '{other}'"
            ))),
        }
    }

    /// Returns the configuration spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Returns whether this is the production mode.
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Normalizes an origin into `scheme://host[:port]`.
///
/// Host names are lower-cased and default ports are dropped, so
/// `HTTPS://App.Example.com:443/` and `https://app.example.com` compare equal.
pub fn normalize_origin(value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed)
        .map_err(|error| AppError::Validation(format!("invalid origin '{trimmed}': {error}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "origin '{trimmed}' must use http or https"
        )));
    }

    if url.host().is_none() {
        return Err(AppError::Validation(format!(
            "origin '{trimmed}' must contain a host"
        )));
    }

    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(AppError::Validation(format!(
            "origin '{trimmed}' must not contain a path, query or fragment"
        )));
    }

    Ok(url.origin().ascii_serialization())
}

/// Set of normalized origins a tenant accepts cross-origin calls from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedOrigins(BTreeSet<String>);

impl AllowedOrigins {
    /// Builds an allow-list, normalizing every entry.
    pub fn new<I, S>(origins: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        origins
            .into_iter()
            .filter(|origin| !origin.as_ref().trim().is_empty())
            .map(|origin| normalize_origin(origin.as_ref()))
            .collect::<AppResult<BTreeSet<_>>>()
            .map(Self)
    }

    /// Parses the persisted JSON array of origin strings.
    pub fn from_json(value: &Value) -> AppResult<Self> {
        let entries = value.as_array().ok_or_else(|| {
            AppError::Validation("allowed origins must be a JSON array".to_owned())
        })?;

        let origins = entries
            .iter()
            .map(|entry| {
                entry.as_str().ok_or_else(|| {
                    AppError::Validation("allowed origins must only contain strings".to_owned())
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Self::new(origins)
    }

    /// Serializes into the persisted JSON array form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::String).collect())
    }

    /// Returns whether the origin is allowed. Unparseable origins never are.
    #[must_use]
    pub fn contains(&self, origin: &str) -> bool {
        normalize_origin(origin).is_ok_and(|normalized| self.0.contains(&normalized))
    }

    /// Returns a copy extended with one more origin.
    pub fn with_origin(&self, origin: &str) -> AppResult<Self> {
        let mut origins = self.0.clone();
        origins.insert(normalize_origin(origin)?);
        Ok(Self(origins))
    }

    /// Iterates over normalized origins in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolved identity of the client application behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    id: TenantId,
    name: String,
    allowed_origins: AllowedOrigins,
    requests_per_minute: u32,
}

impl TenantContext {
    /// Creates a tenant context.
    pub fn new(
        id: TenantId,
        name: impl Into<String>,
        allowed_origins: AllowedOrigins,
        requests_per_minute: u32,
    ) -> AppResult<Self> {
        if requests_per_minute == 0 {
            return Err(AppError::Validation(format!(
                "tenant '{id}' must allow at least one request per minute"
            )));
        }

        Ok(Self {
            id,
            name: name.into(),
            allowed_origins,
            requests_per_minute,
        })
    }

    /// Returns the tenant identifier.
    #[must_use]
    pub fn id(&self) -> &TenantId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the cross-origin allow-list.
    #[must_use]
    pub fn allowed_origins(&self) -> &AllowedOrigins {
        &self.allowed_origins
    }

    /// Returns the per-minute request budget.
    #[must_use]
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Returns a copy whose allow-list also accepts `origin`.
    pub fn allowing_origin(&self, origin: &str) -> AppResult<Self> {
        Ok(Self {
            allowed_origins: self.allowed_origins.with_origin(origin)?,
            ..self.clone()
        })
    }
}

/// Decides which origins count as local for the development fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDevPolicy {
    networks: Vec<IpNet>,
}

impl LocalDevPolicy {
    /// Creates a policy from explicit networks.
    #[must_use]
    pub fn new(networks: Vec<IpNet>) -> Self {
        Self { networks }
    }

    /// Parses a comma-separated CIDR list such as `127.0.0.0/8,::1/128`.
    pub fn parse_networks(value: &str) -> AppResult<Self> {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry.parse::<IpNet>().map_err(|error| {
                    AppError::Validation(format!("invalid local network '{entry}': {error}"))
                })
            })
            .collect::<AppResult<Vec<_>>>()
            .map(Self::new)
    }

    /// Returns whether the origin points at the local machine.
    ///
    /// `localhost` and `*.localhost` always qualify; IP hosts must fall inside
    /// one of the configured networks.
    #[must_use]
    pub fn is_local_origin(&self, origin: &str) -> bool {
        let Ok(url) = Url::parse(origin.trim()) else {
            return false;
        };

        match url.host() {
            Some(Host::Domain(domain)) => {
                let domain = domain.to_ascii_lowercase();
                domain == "localhost" || domain.ends_with(".localhost")
            }
            Some(Host::Ipv4(address)) => self.contains(IpAddr::V4(address)),
            Some(Host::Ipv6(address)) => self.contains(IpAddr::V6(address)),
            None => false,
        }
    }

    fn contains(&self, address: IpAddr) -> bool {
        self.networks.iter().any(|network| network.contains(&address))
    }
}

impl Default for LocalDevPolicy {
    fn default() -> Self {
        Self::parse_networks("127.0.0.0/8,::1/128").unwrap_or_else(|_| Self::new(Vec::new()))
    }
}
