//! HS256 session tokens.
//!
//! Expiry is checked against the caller's clock rather than the library's
//! wall-clock check so tokens follow the same notion of "now" as the guards.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use rosterhub_application::{SessionToken, SessionTokenIssuer};
use rosterhub_core::{AppError, AppResult, TenantId, UserIdentity};

/// Minimum accepted secret length in bytes.
pub const SESSION_SECRET_MIN_LENGTH: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    tenant: String,
    email: Option<String>,
    name: String,
    iat: i64,
    exp: i64,
}

/// JWT implementation of the session token port.
#[derive(Clone)]
pub struct JwtSessionTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: TimeDelta,
}

impl std::fmt::Debug for JwtSessionTokenIssuer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("JwtSessionTokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtSessionTokenIssuer {
    /// Creates an issuer. The secret must be at least 32 bytes.
    pub fn new(secret: &str, ttl: TimeDelta) -> AppResult<Self> {
        if secret.len() < SESSION_SECRET_MIN_LENGTH {
            return Err(AppError::Validation(format!(
                "SESSION_SECRET must be at least {SESSION_SECRET_MIN_LENGTH} characters"
            )));
        }

        if ttl <= TimeDelta::zero() {
            return Err(AppError::Validation(
                "session lifetime must be positive".to_owned(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }
}

impl SessionTokenIssuer for JwtSessionTokenIssuer {
    fn issue(&self, identity: &UserIdentity, now: DateTime<Utc>) -> AppResult<SessionToken> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: identity.subject().to_owned(),
            tenant: identity.tenant_id().to_string(),
            email: identity.email().map(str::to_owned),
            name: identity.display_name().to_owned(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign session token: {error}")))?;

        Ok(SessionToken { token, expires_at })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> AppResult<UserIdentity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.insert("exp".to_owned());

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(map_jwt_error)?
            .claims;

        if claims.exp <= now.timestamp() {
            return Err(AppError::Unauthorized("session has expired".to_owned()));
        }

        Ok(UserIdentity::new(
            claims.sub,
            claims.name,
            claims.email,
            TenantId::parse(claims.tenant)
                .map_err(|_| AppError::Unauthorized("invalid session token".to_owned()))?,
        ))
    }
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> AppError {
    match error.kind() {
        ErrorKind::InvalidSignature => AppError::Unauthorized("invalid session signature".to_owned()),
        ErrorKind::MissingRequiredClaim(claim) => {
            AppError::Unauthorized(format!("session token is missing '{claim}'"))
        }
        _ => AppError::Unauthorized("invalid session token".to_owned()),
    }
}
