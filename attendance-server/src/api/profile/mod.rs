//! Profile self-service endpoints

pub mod handler;

use axum::Router;
use axum::routing::get;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/", get(handler::get_profile).put(handler::save_profile))
}
