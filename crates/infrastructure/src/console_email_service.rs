//! Email sink that writes reset links to the log instead of delivering them.

use async_trait::async_trait;
use rosterhub_application::EmailService;
use rosterhub_core::AppResult;
use rosterhub_domain::TenantContext;
use tracing::info;

/// Logs outbound account email. Delivery is left to an external mailer.
#[derive(Debug, Clone, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates the console sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_password_reset(
        &self,
        tenant: &TenantContext,
        to: &str,
        reset_url: &str,
    ) -> AppResult<()> {
        info!(
            tenant_id = %tenant.id(),
            to,
            reset_url,
            "password reset email (console delivery)"
        );

        Ok(())
    }
}
