//! Axum extractor for the authenticated user

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Middleware normally puts the user here; fall back to decoding the
        // header for routes mounted outside the auth layer.
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(AppError::unauthorized)?;

        let token = crate::auth::JwtService::extract_from_header(auth_header)
            .ok_or_else(|| AppError::invalid_token("Malformed Authorization header"))?;

        let claims = state
            .get_jwt_service()
            .validate_token(token)
            .map_err(|e| AppError::invalid_token(e.to_string()))?;

        CurrentUser::try_from(claims).map_err(AppError::invalid_token)
    }
}
