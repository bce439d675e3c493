//! Attendance server
//!
//! HR attendance and payroll backend: identity and access, attendance
//! marking, an adjustment ledger (penalties / clearances / increments),
//! payroll derivation, broadcast fan-out with read receipts, and CSV
//! reporting.
//!
//! # Module structure
//!
//! ```text
//! attendance-server/src/
//! ├── core/          # Config, state, HTTP server
//! ├── auth/          # JWT, password hashing, middleware
//! ├── api/           # Routes and handlers, one module per resource
//! ├── db/            # SQLite pool and repositories
//! ├── payroll/       # Period salary calculator
//! ├── report/        # Monthly grids and CSV export
//! ├── message/       # Push bus and TCP push server
//! └── utils/         # Errors, logging, time, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod message;
pub mod payroll;
pub mod report;
pub mod routes;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResponse, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Security logging macro - supports tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, then initialize logging from `LOG_LEVEL` / `LOG_DIR`.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty());
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}
