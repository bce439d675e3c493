//! In-process message bus
//!
//! Server-to-client push events flow through a tokio broadcast channel; the
//! TCP push server subscribes and forwards matching messages to connected
//! clients. Publishing is fire-and-forget: a push that reaches nobody is
//! not an error, clients re-sync from the HTTP endpoints.

pub mod tcp_server;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use shared::message::BusMessage;

use crate::utils::AppResult;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bind address for the TCP push server.
    pub tcp_listen_addr: String,
    /// Broadcast channel capacity; slow subscribers lag and drop.
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tcp_listen_addr: "0.0.0.0:9000".to_string(),
            channel_capacity: 1024,
        }
    }
}

#[derive(Debug)]
pub struct MessageBus {
    pub config: TransportConfig,
    server_tx: broadcast::Sender<BusMessage>,
    shutdown: CancellationToken,
}

impl MessageBus {
    pub fn from_config(config: TransportConfig) -> Self {
        let (server_tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            config,
            server_tx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Publish a message to all current subscribers.
    pub async fn publish(&self, message: BusMessage) -> AppResult<u64> {
        match self.server_tx.send(message) {
            Ok(receivers) => Ok(receivers as u64),
            // No connected clients; the message is simply dropped.
            Err(_) => Ok(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.server_tx.subscribe()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::from_config(TransportConfig::default())
    }
}

// Publishing never fails today, but handlers treat it as fallible so the
// transport can grow backpressure without touching call sites.
impl MessageBus {
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{user_channel, EventType};

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let bus = MessageBus::default();
        let mut rx = bus.subscribe();

        let msg = BusMessage::new(EventType::Notification, b"hello".to_vec())
            .with_target(user_channel(7));
        let receivers = bus.publish(msg.clone()).await.unwrap();
        assert_eq!(receivers, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.request_id, msg.request_id);
        assert_eq!(received.target.as_deref(), Some("user:7"));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let bus = MessageBus::default();
        let msg = BusMessage::new(EventType::Notification, Vec::new());
        assert_eq!(bus.publish(msg).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn shutdown_token_propagates() {
        let bus = MessageBus::default();
        let token = bus.shutdown_token();
        assert!(!token.is_cancelled());
        bus.shutdown();
        assert!(token.is_cancelled());
        assert!(bus.is_shutdown());
    }
}
