//! Message bus types
//!
//! Shared between attendance-server and push clients, used for both
//! in-process (memory) and network (TCP) delivery.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// Protocol version
pub const PROTOCOL_VERSION: u16 = 1;

/// Channel (room) a connected client is subscribed to.
///
/// Mirrors the per-user / per-company / admin rooms of the push surface:
/// every client joins `user:{id}`, company members additionally join
/// `company:{id}`, admins additionally join `admins`.
pub fn user_channel(user_id: i64) -> String {
    format!("user:{user_id}")
}

pub fn company_channel(company_id: i64) -> String {
    format!("company:{company_id}")
}

/// Admin-wide channel, receives list-changed sync events.
pub const ADMIN_CHANNEL: &str = "admins";

/// Message bus event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Client handshake (authentication)
    Handshake = 0,
    /// User-facing notification (e.g. new broadcast)
    Notification = 1,
    /// Resource-changed signal (e.g. admin broadcast list refresh)
    Sync = 2,
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::Handshake),
            1 => Ok(EventType::Notification),
            2 => Ok(EventType::Sync),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Handshake => write!(f, "handshake"),
            EventType::Notification => write!(f, "notification"),
            EventType::Sync => write!(f, "sync"),
        }
    }
}

/// Wire message
///
/// `target` selects the delivery channel: `None` broadcasts to every
/// connected client, otherwise only clients subscribed to the named
/// channel receive the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub source: Option<String>,
    pub target: Option<String>,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            source: None,
            target: None,
            payload,
        }
    }

    /// Restrict delivery to one channel.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Build a notification message.
    ///
    /// Serialization of our own payload types cannot fail; an error here
    /// would be a programming bug, so it degrades to an empty payload.
    pub fn notification(payload: &NotificationPayload) -> Self {
        Self::new(
            EventType::Notification,
            serde_json::to_vec(payload).unwrap_or_default(),
        )
    }

    /// Build a sync message.
    pub fn sync(payload: &SyncPayload) -> Self {
        Self::new(
            EventType::Sync,
            serde_json::to_vec(payload).unwrap_or_default(),
        )
    }

    /// Build a handshake message.
    pub fn handshake(payload: &HandshakePayload) -> Self {
        Self::new(
            EventType::Handshake,
            serde_json::to_vec(payload).unwrap_or_default(),
        )
    }

    /// Parse the payload as the given type.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Whether a client subscribed to `channels` should receive this message.
    pub fn matches_channels(&self, channels: &[String]) -> bool {
        match &self.target {
            None => true,
            Some(target) => channels.iter().any(|c| c == target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targeted_message_matches_only_its_channel() {
        let msg = BusMessage::notification(&NotificationPayload::info("Hi", "there"))
            .with_target(user_channel(42));

        assert!(msg.matches_channels(&[user_channel(42), company_channel(7)]));
        assert!(!msg.matches_channels(&[user_channel(43)]));
        assert!(!msg.matches_channels(&[]));
    }

    #[test]
    fn untargeted_message_matches_everyone() {
        let msg = BusMessage::notification(&NotificationPayload::info("Hi", "all"));
        assert!(msg.matches_channels(&[]));
        assert!(msg.matches_channels(&[ADMIN_CHANNEL.to_string()]));
    }

    #[test]
    fn payload_round_trip() {
        let payload = SyncPayload {
            resource: "broadcast".into(),
            version: 3,
            action: "created".into(),
            id: "17".into(),
            data: None,
        };
        let msg = BusMessage::sync(&payload).with_target(ADMIN_CHANNEL);
        let parsed: SyncPayload = msg.parse_payload().unwrap();
        assert_eq!(parsed, payload);
    }
}
