//! Application services and ports.

#![forbid(unsafe_code)]

mod attempt_guard_ports;
mod clock;
mod login_attempt_guard;
mod maintenance_service;
mod origin_gate;
mod password_reset_service;
mod password_reset_throttle;
mod rate_limit_service;
mod session_tokens;
mod store_timeout;
mod tenant_admin_service;
mod tenant_ports;
mod tenant_resolver;
mod token_crypto;
mod user_service;

#[cfg(test)]
mod test_support;

pub use attempt_guard_ports::AttemptGuardRepository;
pub use clock::{Clock, ManualClock, SystemClock};
pub use login_attempt_guard::LoginAttemptGuard;
pub use maintenance_service::{CleanupReport, MaintenanceService};
pub use origin_gate::check_origin;
pub use password_reset_service::{
    EmailService, PasswordResetService, ResetTokenRecord, ResetTokenRepository,
};
pub use password_reset_throttle::PasswordResetThrottle;
pub use rate_limit_service::{
    AttemptInfo, RateLimitDecision, RateLimitRepository, RateLimitRule, RateLimitService,
    TENANT_REQUEST_WINDOW_SECONDS,
};
pub use session_tokens::{SessionToken, SessionTokenIssuer};
pub use store_timeout::StoreTimeout;
pub use tenant_admin_service::{CreateTenantInput, IssuedTenantKey, TenantAdminService};
pub use tenant_ports::{TenantRecord, TenantRegistry};
pub use tenant_resolver::{RequestCredentials, TenantResolver};
pub use token_crypto::{API_KEY_PREFIX, generate_api_key, generate_secret_token, hash_secret};
pub use user_service::{
    AuthenticatedSession, NewUser, PasswordHasher, UserRecord, UserRepository, UserService,
};
