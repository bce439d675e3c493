//! Profile handlers
//!
//! A user fills in their personal details once; the first save locks the
//! profile and later edits are refused until an admin unlocks it.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::user as user_repo;
use crate::utils::validation::{
    validate_optional_text, MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN,
};
use crate::utils::{ok, AppError, AppResult};

pub async fn get_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let user = user_repo::find_by_id(&state.db, current.id)
        .await
        .map_err(AppError::from)?;
    Ok(ok(user))
}

#[derive(Debug, Deserialize)]
pub struct ProfileSave {
    pub cnic: Option<String>,
    pub father_name: Option<String>,
    pub contact_number: Option<String>,
    pub emergency_contact: Option<String>,
    pub whatsapp_number: Option<String>,
    pub blood_group: Option<String>,
    pub current_address: Option<String>,
    pub permanent_address: Option<String>,
}

pub async fn save_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ProfileSave>,
) -> AppResult<impl IntoResponse> {
    validate_optional_text(&req.cnic, "cnic", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.father_name, "father_name", MAX_NAME_LEN)?;
    validate_optional_text(&req.contact_number, "contact_number", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.emergency_contact, "emergency_contact", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.whatsapp_number, "whatsapp_number", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.blood_group, "blood_group", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.current_address, "current_address", MAX_ADDRESS_LEN)?;
    validate_optional_text(&req.permanent_address, "permanent_address", MAX_ADDRESS_LEN)?;

    let user = user_repo::find_by_id(&state.db, current.id)
        .await
        .map_err(AppError::from)?;

    if user.profile_locked {
        return Err(AppError::business_rule(
            "Profile is locked; ask an administrator to unlock it",
        ));
    }

    let updated = user_repo::save_profile(
        &state.db,
        current.id,
        req.cnic.as_deref(),
        req.father_name.as_deref(),
        req.contact_number.as_deref(),
        req.emergency_contact.as_deref(),
        req.whatsapp_number.as_deref(),
        req.blood_group.as_deref(),
        req.current_address.as_deref(),
        req.permanent_address.as_deref(),
    )
    .await
    .map_err(AppError::from)?;

    Ok(ok(updated))
}
