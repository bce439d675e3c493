//! Reporting and export endpoints

pub mod handler;

use axum::Router;
use axum::routing::get;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/me", get(handler::own_report))
        .route("/team", get(handler::team_report))
        .route("/users/{id}", get(handler::user_report))
        .route("/attendance.csv", get(handler::attendance_csv))
        .route("/users.csv", get(handler::users_csv))
}
