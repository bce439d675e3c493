//! Salary increment endpoints (admin)

pub mod handler;

use axum::Router;
use axum::routing::{delete, get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::apply))
        .route("/{id}", delete(handler::revoke))
}
