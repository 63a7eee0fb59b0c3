//! Rolling-window cap on password-reset requests per `(tenant, identity)`.
//!
//! Counts request volume, not failures: nothing clears a window early.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use rosterhub_core::{AppResult, TenantId};
use rosterhub_domain::{
    GuardKey, GuardPurpose, ResetThrottlePolicy, ResetThrottleState, ResetThrottleStatus,
};

use crate::{AttemptGuardRepository, Clock, StoreTimeout};

/// Password-reset throttle service.
#[derive(Clone)]
pub struct PasswordResetThrottle {
    repository: Arc<dyn AttemptGuardRepository>,
    clock: Arc<dyn Clock>,
    timeout: StoreTimeout,
    policy: ResetThrottlePolicy,
}

impl PasswordResetThrottle {
    /// Creates a throttle with the default three-per-hour policy.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AttemptGuardRepository>,
        clock: Arc<dyn Clock>,
        timeout: StoreTimeout,
    ) -> Self {
        Self {
            repository,
            clock,
            timeout,
            policy: ResetThrottlePolicy::default(),
        }
    }

    /// Reports whether another reset request may be issued.
    pub async fn check_reset_rate_limit(
        &self,
        tenant_id: &TenantId,
        identity: &str,
    ) -> AppResult<ResetThrottleStatus> {
        let key = GuardKey::new(tenant_id, identity)?;
        let now = self.clock.now();

        let record = match self
            .timeout
            .run(
                "reset throttle read",
                self.repository.find_record(&key, GuardPurpose::Reset),
            )
            .await
        {
            Ok(record) => record,
            Err(error) if error.is_infrastructure() => {
                tracing::warn!(
                    tenant_id = key.tenant_part(),
                    error = %error,
                    "reset throttle unavailable, assuming full budget"
                );
                return Ok(self.policy.full_budget());
            }
            Err(error) => return Err(error),
        };

        let state = self.policy.evaluate(record.as_ref(), now);
        if state == ResetThrottleState::Expired {
            self.expire(&key, now).await;
        }

        Ok(self.policy.status(state, now))
    }

    /// Counts one reset request and returns the resulting status.
    pub async fn record_reset_attempt(
        &self,
        tenant_id: &TenantId,
        identity: &str,
    ) -> AppResult<ResetThrottleStatus> {
        let key = GuardKey::new(tenant_id, identity)?;
        let now = self.clock.now();

        let record = self
            .timeout
            .run(
                "reset throttle write",
                self.repository.record_reset_request(&key, &self.policy, now),
            )
            .await?;

        tracing::info!(
            tenant_id = key.tenant_part(),
            purpose = GuardPurpose::Reset.as_str(),
            attempts = record.attempts,
            "password reset request counted"
        );

        Ok(self
            .policy
            .status(self.policy.evaluate(Some(&record), now), now))
    }

    async fn expire(&self, key: &GuardKey, now: DateTime<Utc>) {
        let result = self
            .timeout
            .run(
                "reset throttle expiry",
                self.repository
                    .delete_if_expired(key, GuardPurpose::Reset, now),
            )
            .await;

        if let Err(error) = result {
            tracing::warn!(
                tenant_id = key.tenant_part(),
                error = %error,
                "failed to delete expired reset window"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeDelta;
    use rosterhub_core::TenantId;

    use crate::test_support::{InMemoryGuards, clock_at_start};
    use crate::{ManualClock, PasswordResetThrottle, StoreTimeout};

    fn tenant(value: &str) -> TenantId {
        TenantId::parse(value).unwrap_or_else(|error| panic!("tenant: {error}"))
    }

    fn throttle(store: Arc<InMemoryGuards>, clock: Arc<ManualClock>) -> PasswordResetThrottle {
        PasswordResetThrottle::new(store, clock, StoreTimeout::default())
    }

    #[tokio::test]
    async fn fourth_request_in_window_is_throttled_until_window_ends() {
        let store = Arc::new(InMemoryGuards::default());
        let clock = clock_at_start();
        let throttle = throttle(store.clone(), clock.clone());
        let fckoln = tenant("fckoln");

        for _ in 0..3 {
            let recorded = throttle.record_reset_attempt(&fckoln, "user@example.com").await;
            assert!(recorded.is_ok());
            clock.advance(TimeDelta::minutes(5));
        }

        let fourth = throttle
            .check_reset_rate_limit(&fckoln, "USER@example.com")
            .await
            .unwrap_or_else(|error| panic!("check failed: {error}"));
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);
        assert_eq!(fourth.retry_after_minutes, 45);

        clock.advance(TimeDelta::minutes(46));
        let after_window = throttle
            .check_reset_rate_limit(&fckoln, "user@example.com")
            .await
            .unwrap_or_else(|error| panic!("check failed: {error}"));
        assert!(after_window.allowed);
        assert_eq!(after_window.remaining, 3);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn fresh_identity_has_full_budget() {
        let throttle = throttle(Arc::new(InMemoryGuards::default()), clock_at_start());

        let status = throttle
            .check_reset_rate_limit(&tenant("fckoln"), "new@example.com")
            .await
            .unwrap_or_else(|error| panic!("check failed: {error}"));

        assert!(status.allowed);
        assert_eq!(status.remaining, 3);
    }

    #[tokio::test]
    async fn windows_are_isolated_per_tenant() {
        let store = Arc::new(InMemoryGuards::default());
        let throttle = throttle(store, clock_at_start());

        for _ in 0..3 {
            let recorded = throttle
                .record_reset_attempt(&tenant("tenant-a"), "user@example.com")
                .await;
            assert!(recorded.is_ok());
        }

        let other = throttle
            .check_reset_rate_limit(&tenant("tenant-b"), "user@example.com")
            .await
            .unwrap_or_else(|error| panic!("check failed: {error}"));
        assert_eq!(other.remaining, 3);
    }

    #[tokio::test]
    async fn store_outage_on_check_assumes_allowed() {
        let store = Arc::new(InMemoryGuards::default());
        store.set_failing(true);
        let throttle = throttle(store, clock_at_start());

        let status = throttle
            .check_reset_rate_limit(&tenant("fckoln"), "user@example.com")
            .await
            .unwrap_or_else(|error| panic!("check failed: {error}"));
        assert!(status.allowed);

        let recorded = throttle
            .record_reset_attempt(&tenant("fckoln"), "user@example.com")
            .await;
        assert!(recorded.is_err());
    }
}
