//! Authentication middleware
//!
//! Validates the Bearer token on every `/api/` request except the login
//! endpoint and injects [`CurrentUser`] into request extensions.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// Paths that never require a token
const PUBLIC_PATHS: &[&str] = &["/api/auth/login", "/api/health"];

pub async fn require_auth(
    State(state): State<ServerState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // CORS preflight carries no credentials
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let path = request.uri().path();
    if !path.starts_with("/api/") || PUBLIC_PATHS.contains(&path) {
        return Ok(next.run(request).await);
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            security_log!("WARN", "missing_auth_header", path = path);
            AppError::unauthorized()
        })?;

    let token = JwtService::extract_from_header(auth_header).ok_or_else(|| {
        security_log!("WARN", "malformed_auth_header", path = path);
        AppError::invalid_token("Expected Bearer token")
    })?;

    let claims = state
        .get_jwt_service()
        .validate_token(token)
        .map_err(|e| match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            other => {
                security_log!("WARN", "token_rejected", path = path);
                AppError::invalid_token(other.to_string())
            }
        })?;

    let user = CurrentUser::try_from(claims).map_err(AppError::invalid_token)?;

    tracing::debug!(user_id = user.id, role = %user.role, path, "Authenticated request");
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
