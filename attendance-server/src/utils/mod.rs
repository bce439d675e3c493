//! Utility module — common helpers and types
//!
//! - [`AppError`] / [`AppResponse`] - unified errors and response envelope
//! - [`logger`] - tracing setup
//! - [`time`] - business-timezone date helpers
//! - [`validation`] - input validation helpers

pub mod error;
pub mod logger;
pub mod result;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse, ok, ok_with_message};
pub use result::AppResult;
