//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod guard;
mod tenant;
mod user;

pub use guard::{
    GUARD_RETENTION_HOURS, GuardKey, GuardPurpose, GuardRecord, LoginAttemptPolicy,
    LoginAttemptState, LoginAttemptStatus, ResetThrottlePolicy, ResetThrottleState,
    ResetThrottleStatus, normalize_identity,
};
pub use tenant::{
    AllowedOrigins, LocalDevPolicy, RuntimeMode, TenantContext, normalize_origin,
};
pub use user::{
    EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, UserId, validate_password,
    validate_password_for,
};
