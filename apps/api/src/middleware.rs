//! Request pipeline: preflight, tenant resolution, origin gate, request budget.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rosterhub_application::{RequestCredentials, check_origin, hash_secret};
use rosterhub_core::AppError;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const PREFLIGHT_MAX_AGE_SECONDS: &str = "600";
const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";

/// Resolves the tenant and runs the gates before any tenant-scoped handler.
///
/// The resolved `TenantContext` is inserted as a request extension.
pub async fn tenant_pipeline(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let origin = request_origin(request.headers());

    if request.method() == Method::OPTIONS {
        return preflight_response(&state, origin.as_deref());
    }

    let api_key = request
        .headers()
        .get(&state.api_key_header)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let credentials = RequestCredentials {
        api_key: api_key.as_deref(),
        origin: origin.as_deref(),
    };

    let tenant = match state.tenant_resolver.resolve(credentials).await {
        Ok(tenant) => tenant,
        Err(error) => return ApiError::from(error).into_response(),
    };

    if let Err(error) = check_origin(&tenant, origin.as_deref()) {
        return ApiError::from(error).into_response();
    }

    let mut response = match state.rate_limit_service.check_tenant_request(&tenant).await {
        Ok(()) => {
            request.extensions_mut().insert(tenant);
            next.run(request).await
        }
        Err(error) => ApiError::from(error).into_response(),
    };

    if let Some(origin) = origin {
        allow_origin(response.headers_mut(), &origin);
    }

    response
}

/// Guards `/admin/*` with the `ADMIN_TOKEN` bearer.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(expected_hash) = state.admin_token_hash.as_deref() else {
        return Err(AppError::NotFound("admin api is disabled".to_owned()).into());
    };

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    // Only digests are compared, never the raw token.
    let authorized = presented.is_some_and(|token| hash_secret(token) == expected_hash);
    if !authorized {
        return Err(AppError::Unauthorized("admin token required".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Returns the `Origin` header, or the origin of `Referer` when it is absent.
pub fn request_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        return Some(origin.to_owned());
    }

    let referer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())?;
    let url = Url::parse(referer.trim()).ok()?;
    let origin = url.origin();

    origin.is_tuple().then(|| origin.ascii_serialization())
}

fn preflight_response(state: &AppState, origin: Option<&str>) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();

    if let Some(origin) = origin {
        allow_origin(headers, origin);
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );

    let allowed_headers = format!("authorization, content-type, {}", state.api_key_header);
    if let Ok(value) = HeaderValue::from_str(&allowed_headers) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }

    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE_SECONDS),
    );

    response
}

fn allow_origin(headers: &mut HeaderMap, origin: &str) {
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};

    use super::request_origin;

    #[test]
    fn origin_header_wins_over_referer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://admin.fckoeln.de"));
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://players.fckoeln.de/roster"),
        );

        assert_eq!(
            request_origin(&headers).as_deref(),
            Some("https://admin.fckoeln.de")
        );
    }

    #[test]
    fn referer_is_reduced_to_its_origin() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://players.fckoeln.de:8443/roster?team=u17"),
        );

        assert_eq!(
            request_origin(&headers).as_deref(),
            Some("https://players.fckoeln.de:8443")
        );
    }

    #[test]
    fn missing_or_opaque_origin_yields_none() {
        assert_eq!(request_origin(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_static("data:text/plain,hi"));
        assert_eq!(request_origin(&headers), None);
    }
}
