use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== Notification Level ====================

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// System-level notices
    System,
    /// New announcement delivered to a user channel
    Broadcast,
    /// Attendance events
    Attendance,
}

// ==================== Payloads ====================

/// Handshake payload (client -> server)
///
/// Sent as the first frame after connecting; the token is a JWT issued by
/// the HTTP login endpoint. The server derives the client's channels from
/// the token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakePayload {
    pub version: u16,
    /// JWT access token
    pub token: String,
    pub client_name: Option<String>,
}

/// Handshake acknowledgement (server -> client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeAck {
    pub success: bool,
    pub message: String,
    /// Channels the connection was subscribed to.
    pub channels: Vec<String>,
}

/// Notification payload (server -> client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Event name, e.g. "new_broadcast"
    pub event: String,
    pub title: String,
    pub message: String,
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    /// Attached record (e.g. the full broadcast row)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Sync payload (server -> clients)
///
/// Broadcast when a resource changes so open views refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Resource type, e.g. "broadcast"
    pub resource: String,
    /// Monotonically increasing per-resource version
    pub version: u64,
    /// "created" | "updated" | "deleted"
    pub action: String,
    /// Resource ID
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ==================== Convenience Constructors ====================

impl NotificationPayload {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            event: "notification".into(),
            title: title.into(),
            message: message.into(),
            level: NotificationLevel::Info,
            category: NotificationCategory::System,
            data: None,
        }
    }

    /// Payload for the `new_broadcast` push carrying the full record.
    pub fn new_broadcast(title: impl Into<String>, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: "new_broadcast".into(),
            title: title.into(),
            message: message.into(),
            level: NotificationLevel::Info,
            category: NotificationCategory::Broadcast,
            data: Some(data),
        }
    }
}
