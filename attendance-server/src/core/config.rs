use chrono_tz::Tz;

use crate::auth::JwtConfig;

/// Server configuration
///
/// # Environment variables
///
/// Every item can be overridden from the environment:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/attendance | Working directory (database, logs) |
/// | DATABASE_PATH | <WORK_DIR>/attendance.db | SQLite database file |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | MESSAGE_TCP_PORT | 8081 | TCP push-notification port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | BUSINESS_TIMEZONE | Asia/Karachi | Timezone for day boundaries |
/// | DEFAULT_PASSWORD | Default@1234 | Bootstrap admin / password-reset value |
/// | LOG_DIR | (unset) | Daily-rolling log file directory |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/attendance HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// SQLite database path (empty string means <work_dir>/attendance.db)
    pub database_path: Option<String>,
    /// HTTP API port
    pub http_port: u16,
    /// TCP push-notification port (clients connect directly)
    pub message_tcp_port: u16,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Business timezone used for "today" and month boundaries
    pub business_timezone: Tz,
    /// Password assigned to the bootstrap admin and on admin resets
    pub default_password: String,
    /// Optional directory for daily-rolling log files
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let business_timezone = std::env::var("BUSINESS_TIMEZONE")
            .ok()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(chrono_tz::Asia::Karachi);

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/attendance".into()),
            database_path: std::env::var("DATABASE_PATH").ok(),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            message_tcp_port: std::env::var("MESSAGE_TCP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            business_timezone,
            default_password: std::env::var("DEFAULT_PASSWORD")
                .unwrap_or_else(|_| "Default@1234".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// Override the paths and ports (test scenarios).
    pub fn with_overrides(
        work_dir: impl Into<String>,
        http_port: u16,
        message_tcp_port: u16,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_path = None;
        config.http_port = http_port;
        config.message_tcp_port = message_tcp_port;
        config
    }

    /// Resolved SQLite database file path
    pub fn database_file(&self) -> String {
        self.database_path
            .clone()
            .unwrap_or_else(|| format!("{}/attendance.db", self.work_dir))
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
