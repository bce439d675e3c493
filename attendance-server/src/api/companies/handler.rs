//! Company handlers

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use shared::models::{CompanyCreate, CompanyDelete};

use crate::auth::{verify_password, CurrentUser};
use crate::core::ServerState;
use crate::db::repository::{company as company_repo, user as user_repo};
use crate::security_log;
use crate::utils::validation::{validate_required_text, MAX_NAME_LEN};
use crate::utils::{ok, ok_with_message, AppError, AppResult};

fn require_admin(current: &CurrentUser) -> AppResult<()> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Administrator access required"));
    }
    Ok(())
}

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;
    let companies = company_repo::list_with_counts(&state.db)
        .await
        .map_err(AppError::from)?;
    Ok(ok(companies))
}

pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CompanyCreate>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;

    let company = company_repo::create(&state.db, req.name.trim(), current.id)
        .await
        .map_err(AppError::from)?;

    state
        .sync_admins("company", "created", company.id, Some(&company))
        .await;
    Ok(ok(company))
}

/// Deleting a company is destructive enough that the admin re-enters their
/// password, and it is refused while users are still assigned.
pub async fn remove(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<CompanyDelete>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;

    let admin = user_repo::find_by_id(&state.db, current.id)
        .await
        .map_err(AppError::from)?;
    if !verify_password(&req.password, &admin.password_hash) {
        security_log!("WARN", "company_delete_bad_password", by = current.id);
        return Err(AppError::invalid_credentials());
    }

    company_repo::delete(&state.db, id)
        .await
        .map_err(AppError::from)?;

    security_log!("INFO", "company_deleted", company_id = id, by = current.id);
    state.sync_admins::<()>("company", "deleted", id, None).await;

    Ok(ok_with_message((), "Company deleted"))
}
