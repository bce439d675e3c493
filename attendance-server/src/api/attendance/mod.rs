//! Attendance endpoints

pub mod handler;

use axum::Router;
use axum::routing::{get, post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::mark))
        .route("/me", get(handler::list_own))
}
