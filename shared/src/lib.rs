//! Shared types for the attendance platform
//!
//! Domain models, message-bus types and small utilities used by the
//! server and by push clients. Database derives are behind the `db`
//! feature so lightweight clients don't pull in sqlx.

pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Message bus re-exports (for convenient access)
pub use message::{BusMessage, EventType};
