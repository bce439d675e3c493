//! Increment handlers
//!
//! Applying and revoking both touch the increment table and the user's
//! salary; the repository wraps each pair in one transaction.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use shared::message::payload::NotificationPayload;
use shared::models::IncrementApply;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{adjustment as adjustment_repo, user as user_repo};
use crate::security_log;
use crate::utils::validation::{validate_positive_amount, validate_required_text, MAX_NOTE_LEN};
use crate::utils::{ok, AppError, AppResult};

fn require_admin(current: &CurrentUser) -> AppResult<()> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Administrator access required"));
    }
    Ok(())
}

pub async fn apply(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<IncrementApply>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;
    validate_positive_amount(req.amount, "amount")?;
    validate_required_text(&req.reason, "reason", MAX_NOTE_LEN)?;

    user_repo::find_by_id(&state.db, req.user_id)
        .await
        .map_err(AppError::from)?;

    let increment =
        adjustment_repo::apply_increment(&state.db, req.user_id, req.amount, req.reason.trim())
            .await
            .map_err(AppError::from)?;

    security_log!(
        "INFO",
        "increment_applied",
        user_id = req.user_id,
        increment_id = increment.id,
        by = current.id
    );

    let notification = NotificationPayload::info(
        "Salary increment",
        format!(
            "Your salary was increased by {:.2} to {:.2}",
            increment.increment_amount, increment.new_salary
        ),
    );
    state.notify_user(req.user_id, &notification).await;
    state
        .sync_admins("increment", "created", increment.id, Some(&increment))
        .await;

    Ok(ok(increment))
}

pub async fn revoke(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;

    let increment = adjustment_repo::revoke_increment(&state.db, id)
        .await
        .map_err(AppError::from)?;

    security_log!(
        "INFO",
        "increment_revoked",
        user_id = increment.user_id,
        increment_id = id,
        by = current.id
    );
    state.sync_admins::<()>("increment", "deleted", id, None).await;

    Ok(ok(increment))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: i64,
}

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    if !current.is_admin() && current.id != query.user_id {
        return Err(AppError::forbidden("Administrator access required"));
    }

    let increments = adjustment_repo::list_increments(&state.db, query.user_id)
        .await
        .map_err(AppError::from)?;
    Ok(ok(increments))
}
