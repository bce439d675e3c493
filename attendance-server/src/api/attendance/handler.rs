//! Attendance marking and listing handlers

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use shared::models::{AttendanceMark, User};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{attendance as attendance_repo, user as user_repo};
use crate::utils::time::{month_start, parse_month, today_in, validate_not_future};
use crate::utils::validation::validate_non_negative_amount;
use crate::utils::{ok, AppError, AppResult};

/// Resolve and authorize the marking target.
///
/// Admins mark anyone; supervisors mark agents in their own company on
/// their own shift; agents mark nobody.
async fn authorize_mark_target(
    state: &ServerState,
    current: &CurrentUser,
    target_id: i64,
) -> AppResult<User> {
    if current.is_admin() {
        return user_repo::find_by_id(&state.db, target_id)
            .await
            .map_err(AppError::from);
    }

    if current.is_supervisor() {
        let company_id = current
            .company_id
            .ok_or_else(|| AppError::forbidden("Supervisor has no company assigned"))?;
        let target = user_repo::find_agent_in_company(&state.db, target_id, company_id)
            .await
            .map_err(AppError::from)?;

        if target.shift != current.shift {
            return Err(AppError::forbidden(
                "You can only mark attendance for your own shift",
            ));
        }
        return Ok(target);
    }

    Err(AppError::forbidden("You cannot mark attendance"))
}

pub async fn mark(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<AttendanceMark>,
) -> AppResult<impl IntoResponse> {
    validate_non_negative_amount(req.bonus, "bonus")?;
    validate_non_negative_amount(req.penalty, "penalty")?;

    let target = authorize_mark_target(&state, &current, req.user_id).await?;

    let tz = state.config.business_timezone;
    let date = req.date.unwrap_or_else(|| today_in(tz));
    validate_not_future(date, tz)?;

    let attendance = attendance_repo::mark(
        &state.db,
        target.id,
        date,
        req.status,
        req.bonus,
        req.penalty,
        Some(current.id),
    )
    .await
    .map_err(AppError::from)?;

    tracing::info!(
        user_id = target.id,
        date = %date,
        status = ?req.status,
        marked_by = current.id,
        "Attendance marked"
    );

    Ok(ok(attendance))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: i64,
    /// `YYYY-MM`; defaults to the current month.
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnQuery {
    pub month: Option<String>,
}

/// Resolve a `month` query into its `[first, last]` day pair.
fn month_bounds(state: &ServerState, month: Option<&str>) -> AppResult<(NaiveDate, NaiveDate)> {
    let (year, month) = match month {
        Some(m) => parse_month(m)?,
        None => {
            let today = today_in(state.config.business_timezone);
            (today.year(), today.month())
        }
    };
    let start = month_start(year, month)?;
    let end = crate::utils::time::month_dates(year, month)?
        .last()
        .copied()
        .ok_or_else(|| AppError::validation("Empty month"))?;
    Ok((start, end))
}

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    // Viewing another user's records follows the same scope as marking,
    // except agents may read their own.
    if !current.is_admin() && current.id != query.user_id {
        authorize_mark_target(&state, &current, query.user_id).await?;
    }

    let (start, end) = month_bounds(&state, query.month.as_deref())?;
    let records = attendance_repo::list_for_user_range(&state.db, query.user_id, start, end)
        .await
        .map_err(AppError::from)?;
    Ok(ok(records))
}

pub async fn list_own(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<OwnQuery>,
) -> AppResult<impl IntoResponse> {
    let (start, end) = month_bounds(&state, query.month.as_deref())?;
    let records = attendance_repo::list_for_user_range(&state.db, current.id, start, end)
        .await
        .map_err(AppError::from)?;
    Ok(ok(records))
}
