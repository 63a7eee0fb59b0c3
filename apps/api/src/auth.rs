//! Tenant-scoped account endpoints. Every handler here runs behind the
//! tenant pipeline and reads the resolved `TenantContext` extension.

mod password;
mod session;

pub use password::{login_handler, request_reset_handler, reset_password_handler};
pub use session::me_handler;

/// Reply to every accepted reset request, whether or not the email is known.
pub const RESET_REQUESTED_MESSAGE: &str =
    "if an account exists for this email, a password reset link has been sent";
