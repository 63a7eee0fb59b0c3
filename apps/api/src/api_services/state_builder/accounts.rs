use std::sync::Arc;

use rosterhub_application::{
    Clock, EmailService, LoginAttemptGuard, PasswordHasher, PasswordResetService,
    PasswordResetThrottle, UserService,
};
use rosterhub_core::AppResult;
use rosterhub_infrastructure::{ConsoleEmailService, JwtSessionTokenIssuer};

use crate::api_config::ApiConfig;

use super::StoreSet;

pub(super) struct AccountServices {
    pub(super) user_service: UserService,
    pub(super) password_reset_service: PasswordResetService,
}

pub(super) fn build_account_services(
    stores: &StoreSet,
    clock: Arc<dyn Clock>,
    password_hasher: Arc<dyn PasswordHasher>,
    config: &ApiConfig,
) -> AppResult<AccountServices> {
    let session_tokens = Arc::new(JwtSessionTokenIssuer::new(
        &config.session_secret,
        config.session_ttl,
    )?);

    let login_guard = LoginAttemptGuard::new(
        stores.guard_repository.clone(),
        clock.clone(),
        config.store_timeout,
    );
    let reset_throttle = PasswordResetThrottle::new(
        stores.guard_repository.clone(),
        clock.clone(),
        config.store_timeout,
    );

    let email_service: Arc<dyn EmailService> = Arc::new(ConsoleEmailService::new());

    let user_service = UserService::new(
        stores.user_repository.clone(),
        password_hasher.clone(),
        login_guard,
        session_tokens,
        clock.clone(),
    );

    let password_reset_service = PasswordResetService::new(
        stores.user_repository.clone(),
        stores.reset_token_repository.clone(),
        email_service,
        password_hasher,
        reset_throttle,
        clock,
        config.frontend_url.clone(),
    );

    Ok(AccountServices {
        user_service,
        password_reset_service,
    })
}
