use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use rosterhub_core::{AccessDenial, AppResult};
use rosterhub_domain::TenantContext;

use crate::{Clock, StoreTimeout};

use super::config::{RateLimitDecision, RateLimitRule};
use super::ports::RateLimitRepository;

/// How long finished windows are kept before cleanup removes them.
const WINDOW_RETENTION_HOURS: i64 = 24;

/// Application service for fixed-window request limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
    clock: Arc<dyn Clock>,
    timeout: StoreTimeout,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RateLimitRepository>,
        clock: Arc<dyn Clock>,
        timeout: StoreTimeout,
    ) -> Self {
        Self {
            repository,
            clock,
            timeout,
        }
    }

    /// Records an attempt under `"{category}:{key}"` and checks the rule.
    ///
    /// Returns `RateExceeded` once the window count passes the ceiling. Store
    /// failures are returned to the caller unchanged.
    pub async fn check_rate_limit(
        &self,
        rule: &RateLimitRule,
        key: &str,
    ) -> AppResult<RateLimitDecision> {
        let composite_key = format!("{}:{key}", rule.category);
        let now = self.clock.now();
        let info = self
            .timeout
            .run(
                "rate limit record",
                self.repository
                    .record_attempt(&composite_key, rule.window_seconds, now),
            )
            .await?;

        let reset_after_seconds =
            seconds_until(info.window_started_at + TimeDelta::seconds(rule.window_seconds), now);

        if info.attempt_count > rule.max_attempts {
            return Err(AccessDenial::RateExceeded {
                retry_after_seconds: reset_after_seconds,
            }
            .into());
        }

        Ok(RateLimitDecision {
            limit: rule.max_attempts,
            remaining: rule.max_attempts - info.attempt_count,
            reset_after_seconds,
        })
    }

    /// Counts one request against the tenant's per-minute budget.
    ///
    /// Fails open: when the counter store is unreachable the request is
    /// admitted and a warning is logged.
    pub async fn check_tenant_request(&self, tenant: &TenantContext) -> AppResult<()> {
        let rule = RateLimitRule::tenant_requests(tenant);

        match self.check_rate_limit(&rule, tenant.id().as_str()).await {
            Ok(_) => Ok(()),
            Err(error) if error.is_infrastructure() => {
                tracing::warn!(
                    tenant_id = %tenant.id(),
                    error = %error,
                    "request rate limiter unavailable, admitting request"
                );
                Ok(())
            }
            Err(error) => {
                tracing::info!(tenant_id = %tenant.id(), "tenant request rate exceeded");
                Err(error)
            }
        }
    }

    /// Removes windows older than a day. Intended for periodic cleanup.
    pub async fn cleanup(&self) -> AppResult<u64> {
        let cutoff = self.clock.now() - TimeDelta::hours(WINDOW_RETENTION_HOURS);
        self.repository.cleanup_expired(cutoff).await
    }
}

fn seconds_until(instant: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (instant - now).num_milliseconds().max(0);
    u64::try_from((millis + 999) / 1000).unwrap_or(u64::MAX).max(1)
}
