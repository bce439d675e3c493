//! Login, current-user and password change handlers

use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use shared::models::UserInfo;

use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::user as user_repo;
use crate::security_log;
use crate::utils::{ok, ok_with_message, AppError, AppResult};

/// Uniform response time for failed and successful logins alike.
const LOGIN_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    // Flat delay keeps timing identical whether the username exists or not.
    tokio::time::sleep(LOGIN_DELAY).await;

    let username = req.username.trim().to_lowercase();

    let user = user_repo::find_by_username(&state.db, &username)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            security_log!("WARN", "login_unknown_user", username = username.as_str());
            AppError::invalid_credentials()
        })?;

    if !verify_password(&req.password, &user.password_hash) {
        security_log!("WARN", "login_bad_password", username = username.as_str());
        return Err(AppError::invalid_credentials());
    }

    if !user.is_effectively_active() {
        security_log!("WARN", "login_inactive_user", username = username.as_str());
        return Err(AppError::forbidden("Account is deactivated"));
    }

    let token = state
        .get_jwt_service()
        .generate_token(user.id, &user.username, user.role, user.company_id, user.shift)
        .map_err(|e| AppError::internal(e.to_string()))?;

    security_log!("INFO", "login_success", username = username.as_str());

    Ok(ok(LoginResponse {
        token,
        user: UserInfo::from(&user),
    }))
}

pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let user = user_repo::find_by_id(&state.db, current.id)
        .await
        .map_err(AppError::from)?;
    Ok(ok(user))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    if req.new_password.len() < 8 {
        return Err(AppError::validation(
            "New password must be at least 8 characters",
        ));
    }

    let user = user_repo::find_by_id(&state.db, current.id)
        .await
        .map_err(AppError::from)?;

    if !verify_password(&req.current_password, &user.password_hash) {
        return Err(AppError::invalid_credentials());
    }
    if req.new_password == req.current_password {
        return Err(AppError::validation(
            "New password must differ from the current one",
        ));
    }

    let hash = hash_password(&req.new_password)?;
    user_repo::set_password(&state.db, current.id, &hash)
        .await
        .map_err(AppError::from)?;

    security_log!("INFO", "password_changed", user_id = current.id);

    Ok(ok_with_message((), "Password updated"))
}
