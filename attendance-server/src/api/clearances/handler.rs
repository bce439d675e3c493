//! Clearance handlers

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use shared::message::payload::NotificationPayload;
use shared::models::ClearanceCreate;

use crate::api::adjust_scope;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::adjustment as adjustment_repo;
use crate::utils::validation::{validate_positive_amount, validate_required_text, MAX_NOTE_LEN};
use crate::utils::{ok, AppError, AppResult};

pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ClearanceCreate>,
) -> AppResult<impl IntoResponse> {
    validate_positive_amount(req.amount, "amount")?;
    validate_required_text(&req.reason, "reason", MAX_NOTE_LEN)?;

    adjust_scope::authorize_adjust_target(&state, &current, req.user_id).await?;

    let clearance = adjustment_repo::add_clearance(
        &state.db,
        req.user_id,
        req.amount,
        req.reason.trim(),
        current.id,
    )
    .await
    .map_err(AppError::from)?;

    let notification = NotificationPayload::info(
        "Clearance added",
        format!(
            "A clearance of {:.2} was recorded: {}",
            req.amount,
            req.reason.trim()
        ),
    );
    state.notify_user(req.user_id, &notification).await;

    Ok(ok(clearance))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<i64>,
}

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = query.user_id.unwrap_or(current.id);
    adjust_scope::authorize_view_target(&state, &current, user_id).await?;

    let clearances = adjustment_repo::list_clearances(&state.db, user_id)
        .await
        .map_err(AppError::from)?;
    Ok(ok(clearances))
}
