//! User management endpoints (admin)

pub mod handler;

use axum::Router;
use axum::routing::{get, post, put};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", put(handler::update))
        .route("/{id}/toggle-active", post(handler::toggle_active))
        .route("/{id}/reset-password", post(handler::reset_password))
        .route("/{id}/unlock-profile", post(handler::unlock_profile))
}
