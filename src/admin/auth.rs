//! Bearer token check for admin routes.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::{DomainError, ErrorCode, ErrorContext, SafeField};
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// `None` when the request carries the expected token.
fn rejection(headers: &HeaderMap, api_key: &str) -> Option<ErrorCode> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Some(ErrorCode::AUTH_MISSING);
    };
    let token = value.to_str().ok().and_then(|v| v.strip_prefix("Bearer "));
    if token == Some(api_key) {
        None
    } else {
        Some(ErrorCode::AUTH_INVALID)
    }
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(code) = rejection(request.headers(), &state.config.admin.api_key) else {
        return Ok(next.run(request).await);
    };

    Err(ApiError::new(
        "admin",
        DomainError::auth(
            code,
            "admin credentials rejected",
            None,
            ErrorContext::new().with_safe(SafeField::Uri, request.uri().path()),
        ),
    ))
}
