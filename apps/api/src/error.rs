use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use rosterhub_core::{AccessDenial, AppError};

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl From<AccessDenial> for ApiError {
    fn from(value: AccessDenial) -> Self {
        Self(AppError::Denied(value))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Denied(denial) => denial_status(denial),
            AppError::Unavailable(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Denied(denial) => denial.code(),
            AppError::Unavailable(_) | AppError::Internal(_) => "internal_error",
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            AppError::Validation(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::Unauthorized(message)
            | AppError::Forbidden(message) => message.clone(),
            AppError::Denied(denial) => denial.to_string(),
            AppError::Unavailable(_) | AppError::Internal(_) => {
                "internal server error".to_owned()
            }
        }
    }
}

fn denial_status(denial: &AccessDenial) -> StatusCode {
    match denial {
        AccessDenial::MissingCredential | AccessDenial::InvalidCredential => {
            StatusCode::UNAUTHORIZED
        }
        AccessDenial::TenantDisabled | AccessDenial::OriginRejected { .. } => {
            StatusCode::FORBIDDEN
        }
        AccessDenial::RateExceeded { .. }
        | AccessDenial::LoginLocked { .. }
        | AccessDenial::ResetThrottled { .. } => StatusCode::TOO_MANY_REQUESTS,
        AccessDenial::InvalidOrExpiredResetToken => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_infrastructure() {
            tracing::error!(error = %self.0, "request failed");
        }

        let status = self.status();
        let retry_after = match &self.0 {
            AppError::Denied(denial) => denial.retry_after_seconds(),
            _ => None,
        };

        let mut response = (
            status,
            Json(ErrorResponse::new(self.code(), self.message())),
        )
            .into_response();

        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }

        response
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use rosterhub_core::{AccessDenial, AppError};

    use super::ApiError;

    #[test]
    fn login_lock_is_429_with_retry_after() {
        let response = ApiError::from(AccessDenial::LoginLocked {
            locked_for_seconds: 840,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok()),
            Some("840")
        );
    }

    #[test]
    fn gate_denials_map_to_their_statuses() {
        let cases = [
            (AccessDenial::MissingCredential, StatusCode::UNAUTHORIZED),
            (AccessDenial::InvalidCredential, StatusCode::UNAUTHORIZED),
            (AccessDenial::TenantDisabled, StatusCode::FORBIDDEN),
            (
                AccessDenial::OriginRejected {
                    origin: "https://evil.example".to_owned(),
                },
                StatusCode::FORBIDDEN,
            ),
            (AccessDenial::InvalidOrExpiredResetToken, StatusCode::BAD_REQUEST),
        ];

        for (denial, status) in cases {
            assert_eq!(ApiError::from(denial).into_response().status(), status);
        }
    }

    #[test]
    fn infrastructure_errors_hide_their_detail() {
        let error = ApiError::from(AppError::Unavailable(
            "connection refused to 10.0.0.7:5432".to_owned(),
        ));

        assert_eq!(error.message(), "internal server error");
        assert_eq!(error.code(), "internal_error");
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
