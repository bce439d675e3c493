//! Admin user management handlers

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use shared::models::{Role, User, UserCreate, UserUpdate};

use crate::auth::{hash_password, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::{company as company_repo, user as user_repo};
use crate::security_log;
use crate::utils::validation::{
    validate_email, validate_non_negative_amount, validate_required_text, MAX_NAME_LEN,
};
use crate::utils::{ok, ok_with_message, AppError, AppResult};

fn require_admin(current: &CurrentUser) -> AppResult<()> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Administrator access required"));
    }
    Ok(())
}

/// User plus resolved company name, for the admin list view.
#[derive(Debug, Serialize)]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: User,
    pub company_name: Option<String>,
}

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;

    let users = user_repo::list_all(&state.db).await.map_err(AppError::from)?;
    let companies = company_repo::list_with_counts(&state.db)
        .await
        .map_err(AppError::from)?;
    let names: HashMap<i64, String> =
        companies.into_iter().map(|c| (c.id, c.name)).collect();

    let items: Vec<UserListItem> = users
        .into_iter()
        .map(|user| {
            let company_name = user.company_id.and_then(|id| names.get(&id).cloned());
            UserListItem { user, company_name }
        })
        .collect();

    Ok(ok(items))
}

async fn validate_create(state: &ServerState, req: &UserCreate) -> AppResult<()> {
    validate_required_text(&req.first_name, "first_name", MAX_NAME_LEN)?;
    validate_required_text(&req.last_name, "last_name", MAX_NAME_LEN)?;
    validate_required_text(&req.username, "username", MAX_NAME_LEN)?;
    validate_email(&req.email)?;
    validate_non_negative_amount(req.salary, "salary")?;
    validate_non_negative_amount(req.travel_allowance_amount, "travel_allowance_amount")?;

    // Non-admins must belong to an existing company.
    match (req.role, req.company_id) {
        (Role::Admin, _) => {}
        (_, None) => {
            return Err(AppError::validation(
                "A company is required for supervisors and agents",
            ));
        }
        (_, Some(company_id)) => {
            company_repo::find_by_id(&state.db, company_id)
                .await
                .map_err(AppError::from)?;
        }
    }

    Ok(())
}

pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<UserCreate>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;
    validate_create(&state, &req).await?;

    let password = req
        .password
        .clone()
        .unwrap_or_else(|| state.config.default_password.clone());
    let hash = hash_password(&password)?;

    let mut req = req;
    req.username = req.username.trim().to_lowercase();

    let user = user_repo::create(&state.db, &req, &hash)
        .await
        .map_err(AppError::from)?;

    security_log!("INFO", "user_created", user_id = user.id, by = current.id);
    state.sync_admins("user", "created", user.id, Some(&user)).await;

    Ok(ok(user))
}

pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UserUpdate>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;

    if let Some(email) = &req.email {
        validate_email(email)?;
    }
    if let Some(salary) = req.salary {
        validate_non_negative_amount(salary, "salary")?;
    }
    if let Some(company_id) = req.company_id {
        company_repo::find_by_id(&state.db, company_id)
            .await
            .map_err(AppError::from)?;
    }

    let user = user_repo::update(&state.db, id, &req)
        .await
        .map_err(AppError::from)?;

    state.sync_admins("user", "updated", user.id, Some(&user)).await;
    Ok(ok(user))
}

pub async fn toggle_active(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;

    let user = user_repo::find_by_id(&state.db, id)
        .await
        .map_err(AppError::from)?;

    // The bootstrap account stays active no matter what.
    if user.username == "admin" {
        return Err(AppError::business_rule(
            "The bootstrap admin account cannot be deactivated",
        ));
    }

    let updated = user_repo::set_active(&state.db, id, !user.is_active)
        .await
        .map_err(AppError::from)?;

    security_log!(
        "INFO",
        "user_toggle_active",
        user_id = id,
        active = updated.is_active,
        by = current.id
    );
    state
        .sync_admins("user", "updated", updated.id, Some(&updated))
        .await;

    Ok(ok(updated))
}

pub async fn reset_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;

    user_repo::find_by_id(&state.db, id)
        .await
        .map_err(AppError::from)?;

    let hash = hash_password(&state.config.default_password)?;
    user_repo::set_password(&state.db, id, &hash)
        .await
        .map_err(AppError::from)?;

    security_log!("INFO", "password_reset", user_id = id, by = current.id);
    Ok(ok_with_message((), "Password reset to the default"))
}

pub async fn unlock_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;

    let user = user_repo::unlock_profile(&state.db, id)
        .await
        .map_err(AppError::from)?;

    security_log!("INFO", "profile_unlocked", user_id = id, by = current.id);
    Ok(ok(user))
}
