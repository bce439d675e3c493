//! HTTP API
//!
//! One submodule per resource; each exposes `router()` and the routes are
//! nested under `/api/<resource>` by [`crate::routes::build_router`].

pub mod adjust_scope;
pub mod attendance;
pub mod auth;
pub mod broadcasts;
pub mod clearances;
pub mod companies;
pub mod health;
pub mod increments;
pub mod penalties;
pub mod profile;
pub mod reports;
pub mod users;
