//! Broadcast handlers
//!
//! Creation persists the record, resolves the audience and fans out a
//! `new_broadcast` push per recipient; the pull endpoints stay the source
//! of truth for clients that miss a push.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use shared::message::payload::NotificationPayload;
use shared::models::{Broadcast, BroadcastCreate, BroadcastTarget, User};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{broadcast as broadcast_repo, user as user_repo};
use crate::utils::validation::{
    validate_optional_text, validate_required_text, MAX_MESSAGE_LEN, MAX_NOTE_LEN,
};
use crate::utils::{ok, ok_with_message, AppError, AppResult};

/// Validate the sender/target combination and pin the effective company.
fn authorize_create(
    current: &CurrentUser,
    req: &BroadcastCreate,
) -> AppResult<Option<i64>> {
    if current.is_admin() {
        return match req.target {
            BroadcastTarget::Shift => Err(AppError::forbidden(
                "Shift broadcasts are issued by supervisors",
            )),
            BroadcastTarget::All | BroadcastTarget::Supervisors => Ok(None),
            BroadcastTarget::Company | BroadcastTarget::SupervisorsCompany => {
                let company_id = req
                    .company_id
                    .ok_or_else(|| AppError::validation("company_id is required"))?;
                Ok(Some(company_id))
            }
        };
    }

    if current.is_supervisor() {
        let own_company = current
            .company_id
            .ok_or_else(|| AppError::forbidden("Supervisor has no company assigned"))?;
        return match req.target {
            BroadcastTarget::Company => Ok(Some(own_company)),
            BroadcastTarget::Shift => {
                if req.shift.is_none() {
                    return Err(AppError::validation("shift is required"));
                }
                Ok(Some(own_company))
            }
            _ => Err(AppError::forbidden(
                "Supervisors can only broadcast to their own company or shift",
            )),
        };
    }

    Err(AppError::forbidden("You cannot send broadcasts"))
}

/// Resolve who gets the push. Explicit agent ids narrow a company broadcast
/// to just those agents, each verified against the sender's company.
async fn resolve_recipients(
    state: &ServerState,
    current: &CurrentUser,
    req: &BroadcastCreate,
    company_id: Option<i64>,
) -> AppResult<Vec<User>> {
    if !req.agent_ids.is_empty() {
        let own_company = company_id
            .ok_or_else(|| AppError::validation("Agent lists require a company target"))?;
        let mut recipients = Vec::with_capacity(req.agent_ids.len());
        for agent_id in &req.agent_ids {
            let agent = user_repo::find_agent_in_company(&state.db, *agent_id, own_company)
                .await
                .map_err(AppError::from)?;
            recipients.push(agent);
        }
        return Ok(recipients);
    }

    user_repo::resolve_broadcast_audience(&state.db, req.target, company_id, req.shift)
        .await
        .map_err(AppError::from)
        .map(|users| {
            // The sender never needs a push about their own announcement.
            users.into_iter().filter(|u| u.id != current.id).collect()
        })
}

pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<BroadcastCreate>,
) -> AppResult<impl IntoResponse> {
    validate_required_text(&req.message, "message", MAX_MESSAGE_LEN)?;
    validate_optional_text(&req.title, "title", MAX_NOTE_LEN)?;

    let company_id = authorize_create(&current, &req)?;
    let recipients = resolve_recipients(&state, &current, &req, company_id).await?;

    let broadcast = broadcast_repo::create(
        &state.db,
        current.id,
        company_id,
        req.target,
        req.shift,
        req.title.as_deref(),
        &req.message,
    )
    .await
    .map_err(AppError::from)?;

    let title = broadcast.title.clone().unwrap_or_else(|| "Announcement".to_string());
    let record = serde_json::to_value(&broadcast)
        .map_err(|e| AppError::internal(format!("Broadcast encode failed: {e}")))?;
    let notification =
        NotificationPayload::new_broadcast(title, broadcast.message.clone(), record);

    for recipient in &recipients {
        state.notify_user(recipient.id, &notification).await;
    }
    state
        .sync_admins("broadcast", "created", broadcast.id, Some(&broadcast))
        .await;

    tracing::info!(
        broadcast_id = broadcast.id,
        target = %broadcast.target,
        recipients = recipients.len(),
        "Broadcast sent"
    );

    Ok(ok(broadcast))
}

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let broadcasts: Vec<Broadcast> = if current.is_admin() {
        broadcast_repo::list_all(&state.db).await.map_err(AppError::from)?
    } else if current.is_supervisor() {
        let company_id = current
            .company_id
            .ok_or_else(|| AppError::forbidden("Supervisor has no company assigned"))?;
        broadcast_repo::list_for_supervisor(&state.db, current.id, company_id)
            .await
            .map_err(AppError::from)?
    } else {
        broadcast_repo::list_eligible(&state.db, current.role, current.company_id, current.shift)
            .await
            .map_err(AppError::from)?
    };

    Ok(ok(broadcasts))
}

pub async fn unread(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let broadcasts = broadcast_repo::list_unread(
        &state.db,
        current.id,
        current.role,
        current.company_id,
        current.shift,
    )
    .await
    .map_err(AppError::from)?;
    Ok(ok(broadcasts))
}

#[derive(Debug, Serialize)]
pub struct SeenResponse {
    pub broadcast_id: i64,
    pub seen_at: i64,
}

pub async fn mark_seen(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let seen_at = broadcast_repo::mark_seen(&state.db, id, current.id)
        .await
        .map_err(AppError::from)?;
    Ok(ok(SeenResponse {
        broadcast_id: id,
        seen_at,
    }))
}

pub async fn remove(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Administrator access required"));
    }

    let deleted = broadcast_repo::delete(&state.db, id)
        .await
        .map_err(|e| match e {
            // Out-of-window deletion is a state rule, not bad input.
            crate::db::repository::RepoError::Validation(msg) => AppError::business_rule(msg),
            other => AppError::from(other),
        })?;

    state.sync_admins::<()>("broadcast", "deleted", deleted.id, None).await;

    Ok(ok_with_message((), "Broadcast deleted"))
}

pub async fn receipts(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Administrator access required"));
    }

    // 404 for a missing broadcast, not an empty list.
    broadcast_repo::find_by_id(&state.db, id)
        .await
        .map_err(AppError::from)?;

    let receipts = broadcast_repo::receipts(&state.db, id)
        .await
        .map_err(AppError::from)?;
    Ok(ok(receipts))
}
