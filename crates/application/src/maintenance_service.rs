use std::sync::Arc;

use rosterhub_core::AppResult;

use crate::{AttemptGuardRepository, Clock, RateLimitService, ResetTokenRepository};

/// Rows removed by one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Guard records past their lock, window or retention.
    pub guard_records: u64,
    /// Request windows older than the retention period.
    pub request_windows: u64,
    /// Expired password-reset tokens.
    pub reset_tokens: u64,
}

/// Purges expired abuse-control state.
///
/// Lazy expiry already keeps reads correct; this only bounds table growth.
#[derive(Clone)]
pub struct MaintenanceService {
    guard_repository: Arc<dyn AttemptGuardRepository>,
    rate_limit_service: RateLimitService,
    reset_token_repository: Arc<dyn ResetTokenRepository>,
    clock: Arc<dyn Clock>,
}

impl MaintenanceService {
    /// Creates a new maintenance service.
    #[must_use]
    pub fn new(
        guard_repository: Arc<dyn AttemptGuardRepository>,
        rate_limit_service: RateLimitService,
        reset_token_repository: Arc<dyn ResetTokenRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            guard_repository,
            rate_limit_service,
            reset_token_repository,
            clock,
        }
    }

    /// Runs one cleanup pass over every store.
    pub async fn run_cleanup(&self) -> AppResult<CleanupReport> {
        let now = self.clock.now();
        let guard_records = self.guard_repository.delete_expired(now).await?;
        let request_windows = self.rate_limit_service.cleanup().await?;
        let reset_tokens = self.reset_token_repository.delete_expired(now).await?;

        Ok(CleanupReport {
            guard_records,
            request_windows,
            reset_tokens,
        })
    }
}
