use rosterhub_domain::TenantContext;

/// Length of the per-tenant request window.
pub const TENANT_REQUEST_WINDOW_SECONDS: i64 = 60;

/// Configuration for a rate limit rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Key namespace, e.g. `request`.
    pub category: String,
    /// Maximum number of attempts allowed in the window.
    pub max_attempts: i64,
    /// Window duration in seconds.
    pub window_seconds: i64,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(category: impl Into<String>, max_attempts: i64, window_seconds: i64) -> Self {
        Self {
            category: category.into(),
            max_attempts,
            window_seconds,
        }
    }

    /// Rule bounding all requests of one tenant per minute.
    #[must_use]
    pub fn tenant_requests(tenant: &TenantContext) -> Self {
        Self::new(
            "request",
            i64::from(tenant.requests_per_minute()),
            TENANT_REQUEST_WINDOW_SECONDS,
        )
    }
}

/// Outcome of an admitted rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Configured ceiling.
    pub limit: i64,
    /// Attempts left in the window after this one.
    pub remaining: i64,
    /// Seconds until the window restarts.
    pub reset_after_seconds: u64,
}
