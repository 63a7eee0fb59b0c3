//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod console_email_service;
mod in_memory_store;
mod jwt_session_token_issuer;
mod postgres_attempt_guard_repository;
mod postgres_rate_limit_repository;
mod postgres_reset_token_repository;
mod postgres_tenant_registry;
mod postgres_user_repository;
mod redis_rate_limit_repository;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use console_email_service::ConsoleEmailService;
pub use in_memory_store::InMemoryStore;
pub use jwt_session_token_issuer::{JwtSessionTokenIssuer, SESSION_SECRET_MIN_LENGTH};
pub use postgres_attempt_guard_repository::PostgresAttemptGuardRepository;
pub use postgres_rate_limit_repository::PostgresRateLimitRepository;
pub use postgres_reset_token_repository::PostgresResetTokenRepository;
pub use postgres_tenant_registry::PostgresTenantRegistry;
pub use postgres_user_repository::PostgresUserRepository;
pub use redis_rate_limit_repository::RedisRateLimitRepository;
