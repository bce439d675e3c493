//! Health check endpoint

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;

use crate::core::ServerState;
use crate::utils::ok;

pub fn router() -> Router<ServerState> {
    Router::new().route("/", get(health))
}

async fn health() -> impl IntoResponse {
    ok(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
