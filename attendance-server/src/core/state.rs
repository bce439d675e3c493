use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;

use shared::message::{ADMIN_CHANNEL, BusMessage, NotificationPayload, SyncPayload, user_channel};

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::message::{MessageBus, TransportConfig};
use crate::utils::{AppError, AppResult};

/// Resource version manager
///
/// Lock-free concurrent version counters, one per resource type, used by
/// sync events so clients can tell stale data from fresh.
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// Increment the version for a resource and return the new value.
    /// Unknown resources start from 0 (first call returns 1).
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current version for a resource (0 if never synced).
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// Server state — shared handle to every service
///
/// Constructed once at startup and cloned into each request handler
/// (all fields are cheap shallow copies). This is the application-context
/// object: no global singletons anywhere.
///
/// | Field | Description |
/// |-------|-------------|
/// | config | Immutable configuration |
/// | db | SQLite connection pool |
/// | message_bus | Push-notification bus |
/// | jwt_service | Token issue/validate |
/// | resource_versions | Sync version counters |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: SqlitePool,
    pub message_bus: Arc<MessageBus>,
    pub jwt_service: Arc<JwtService>,
    pub resource_versions: Arc<ResourceVersions>,
}

impl ServerState {
    /// Initialize the server state:
    ///
    /// 1. ensure the working directory exists
    /// 2. open the database (WAL) and run migrations
    /// 3. ensure the bootstrap admin account exists
    /// 4. construct the message bus and JWT service
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            AppError::internal(format!(
                "Failed to create work dir {}: {e}",
                config.work_dir
            ))
        })?;

        let db_service = DbService::new(&config.database_file()).await?;
        let pool = db_service.pool;

        crate::db::repository::user::ensure_default_admin(&pool, &config.default_password)
            .await
            .map_err(|e| AppError::database(format!("Failed to ensure default admin: {e}")))?;

        let bus_config = TransportConfig {
            tcp_listen_addr: format!("0.0.0.0:{}", config.message_tcp_port),
            ..Default::default()
        };

        Ok(Self {
            config: config.clone(),
            db: pool,
            message_bus: Arc::new(MessageBus::from_config(bus_config)),
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            resource_versions: Arc::new(ResourceVersions::new()),
        })
    }

    /// Start background tasks (the TCP push server).
    /// Must be called before `Server::run()` accepts requests.
    pub async fn start_background_tasks(&self) {
        let bus = self.message_bus.clone();
        let jwt = self.jwt_service.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::message::tcp_server::serve(bus, jwt).await {
                tracing::error!("Push TCP server failed: {e}");
            }
        });
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// Push a notification to one user's private channel.
    ///
    /// Fire-and-forget: a disconnected recipient discovers the event via
    /// the pull-based unread query instead.
    pub async fn notify_user(&self, user_id: i64, payload: &NotificationPayload) {
        let msg = BusMessage::notification(payload).with_target(user_channel(user_id));
        let _ = self.message_bus.publish(msg).await;
    }

    /// Push a resource-changed sync event to the admin channel so open
    /// admin views refresh. Version numbers auto-increment per resource.
    pub async fn sync_admins<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: i64,
        data: Option<&T>,
    ) {
        let version = self.resource_versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        let msg = BusMessage::sync(&payload).with_target(ADMIN_CHANNEL);
        let _ = self.message_bus.publish(msg).await;
    }
}
