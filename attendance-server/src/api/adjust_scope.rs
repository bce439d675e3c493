//! Shared authorization scope for the adjustment ledger
//!
//! Penalties, clearances and increment history all follow the same rule:
//! admins reach anyone, supervisors reach agents inside their own company,
//! agents reach only themselves (read side).

use shared::models::User;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user as user_repo;
use crate::utils::{AppError, AppResult};

/// Who may write a ledger entry for `target_id`.
pub async fn authorize_adjust_target(
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
        // Out-of-scope targets read as not-found so supervisors cannot probe
        // other companies' rosters.
        return user_repo::find_agent_in_company(&state.db, target_id, company_id)
            .await
            .map_err(AppError::from);
    }

    Err(AppError::forbidden("You cannot modify the ledger"))
}

/// Who may read the ledger of `target_id`.
pub async fn authorize_view_target(
    state: &ServerState,
    current: &CurrentUser,
    target_id: i64,
) -> AppResult<()> {
    if current.id == target_id {
        return Ok(());
    }
    authorize_adjust_target(state, current, target_id).await?;
    Ok(())
}
