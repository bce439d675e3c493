//! Broadcast endpoints

pub mod handler;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/unread", get(handler::unread))
        .route("/{id}", delete(handler::remove))
        .route("/{id}/seen", post(handler::mark_seen))
        .route("/{id}/receipts", get(handler::receipts))
}
