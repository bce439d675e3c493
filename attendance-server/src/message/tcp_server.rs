//! TCP push server
//!
//! Line-delimited JSON over plain TCP. A client sends one handshake line
//! carrying its JWT; the server answers with the channel list it joined and
//! then streams every bus message addressed to one of those channels (or to
//! nobody in particular).

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use shared::message::payload::{HandshakeAck, HandshakePayload};
use shared::message::{company_channel, user_channel, ADMIN_CHANNEL, PROTOCOL_VERSION};

use crate::auth::{CurrentUser, JwtService};
use crate::message::MessageBus;
use crate::utils::{AppError, AppResult};

pub async fn serve(bus: Arc<MessageBus>, jwt: Arc<JwtService>) -> AppResult<()> {
    let listener = TcpListener::bind(&bus.config.tcp_listen_addr)
        .await
        .map_err(|e| AppError::internal(format!("Push server bind failed: {e}")))?;

    tracing::info!(addr = %bus.config.tcp_listen_addr, "Push server listening");

    let shutdown = bus.shutdown_token();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "Push client connected");
                        let bus = Arc::clone(&bus);
                        let jwt = Arc::clone(&jwt);
                        let token = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_client(stream, bus, jwt, token).await {
                                tracing::debug!(%peer, error = %e, "Push client closed");
                            }
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "Push accept failed"),
                }
            }
            _ = shutdown.cancelled() => {
                tracing::info!("Push server shutting down");
                return Ok(());
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    bus: Arc<MessageBus>,
    jwt: Arc<JwtService>,
    shutdown: CancellationToken,
) -> AppResult<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    // First line must be the handshake.
    let first = lines
        .next_line()
        .await
        .map_err(|e| AppError::internal(format!("Handshake read failed: {e}")))?
        .ok_or_else(|| AppError::invalid("Client disconnected before handshake"))?;

    let channels = match authenticate(&first, &jwt) {
        Ok(channels) => {
            let ack = HandshakeAck {
                success: true,
                message: "connected".to_string(),
                channels: channels.clone(),
            };
            send_line(&mut writer, &ack).await?;
            channels
        }
        Err(e) => {
            let ack = HandshakeAck {
                success: false,
                message: e.to_string(),
                channels: Vec::new(),
            };
            send_line(&mut writer, &ack).await?;
            return Err(e);
        }
    };

    let mut rx = bus.subscribe();
    loop {
        tokio::select! {
            received = rx.recv() => {
                match received {
                    Ok(msg) if msg.matches_channels(&channels) => {
                        send_line(&mut writer, &msg).await?;
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Push client lagged, messages dropped");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }
            // Client lines after the handshake are ignored, but EOF ends the
            // session.
            line = lines.next_line() => {
                match line {
                    Ok(Some(_)) => {}
                    Ok(None) => return Ok(()),
                    Err(e) => {
                        return Err(AppError::internal(format!("Push read failed: {e}")));
                    }
                }
            }
            _ = shutdown.cancelled() => return Ok(()),
        }
    }
}

/// Validate the handshake token and derive the channels this client joins.
fn authenticate(line: &str, jwt: &JwtService) -> AppResult<Vec<String>> {
    let handshake: HandshakePayload = serde_json::from_str(line)
        .map_err(|e| AppError::invalid(format!("Malformed handshake: {e}")))?;

    if handshake.version != PROTOCOL_VERSION {
        return Err(AppError::invalid(format!(
            "Unsupported protocol version {}",
            handshake.version
        )));
    }

    let claims = jwt
        .validate_token(&handshake.token)
        .map_err(|e| AppError::invalid_token(e.to_string()))?;
    let user = CurrentUser::try_from(claims).map_err(AppError::invalid_token)?;

    let mut channels = vec![user_channel(user.id)];
    if let Some(company_id) = user.company_id {
        channels.push(company_channel(company_id));
    }
    if user.is_admin() {
        channels.push(ADMIN_CHANNEL.to_string());
    }

    tracing::debug!(user_id = user.id, ?channels, "Push client authenticated");
    Ok(channels)
}

async fn send_line<T: serde::Serialize, W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    value: &T,
) -> AppResult<()> {
    let mut line = serde_json::to_vec(value)
        .map_err(|e| AppError::internal(format!("Push encode failed: {e}")))?;
    line.push(b'\n');
    writer
        .write_all(&line)
        .await
        .map_err(|e| AppError::internal(format!("Push write failed: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::message::TransportConfig;
    use shared::message::{BusMessage, EventType};
    use shared::models::Role;
    use tokio::io::AsyncReadExt;

    fn jwt_service() -> Arc<JwtService> {
        Arc::new(JwtService::with_config(JwtConfig {
            secret: "push-test-secret-push-test-secret!!".into(),
            expiration_minutes: 60,
            issuer: "attendance-server".into(),
            audience: "attendance-clients".into(),
        }))
    }

    async fn read_line(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            stream.read_exact(&mut byte).await.unwrap();
            if byte[0] == b'\n' {
                break;
            }
            buf.push(byte[0]);
        }
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn handshake_and_targeted_delivery() {
        let bus = Arc::new(MessageBus::from_config(TransportConfig {
            tcp_listen_addr: "127.0.0.1:0".into(),
            ..Default::default()
        }));
        let jwt = jwt_service();

        // Bind here so the test knows the ephemeral port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        {
            let bus = Arc::clone(&bus);
            let jwt = Arc::clone(&jwt);
            tokio::spawn(async move {
                let (stream, _) = listener.accept().await.unwrap();
                let token = bus.shutdown_token();
                let _ = handle_client(stream, bus, jwt, token).await;
            });
        }

        let token = jwt
            .generate_token(7, "sara", Role::Agent, Some(3), None)
            .unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        let handshake = HandshakePayload {
            version: PROTOCOL_VERSION,
            token,
            client_name: Some("test".into()),
        };
        let mut line = serde_json::to_vec(&handshake).unwrap();
        line.push(b'\n');
        client.write_all(&line).await.unwrap();

        let ack: HandshakeAck = serde_json::from_str(&read_line(&mut client).await).unwrap();
        assert!(ack.success);
        assert!(ack.channels.contains(&"user:7".to_string()));
        assert!(ack.channels.contains(&"company:3".to_string()));
        assert!(!ack.channels.contains(&ADMIN_CHANNEL.to_string()));

        // A message for another user must not arrive; one for this user must.
        bus.publish(
            BusMessage::new(EventType::Notification, b"other".to_vec())
                .with_target(user_channel(99)),
        )
        .await
        .unwrap();
        bus.publish(
            BusMessage::new(EventType::Notification, b"mine".to_vec())
                .with_target(user_channel(7)),
        )
        .await
        .unwrap();

        let delivered: BusMessage = serde_json::from_str(&read_line(&mut client).await).unwrap();
        assert_eq!(delivered.target.as_deref(), Some("user:7"));
        assert_eq!(delivered.payload, b"mine");
    }

    #[tokio::test]
    async fn bad_token_is_refused() {
        let bus = Arc::new(MessageBus::default());
        let jwt = jwt_service();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        {
            let bus = Arc::clone(&bus);
            let jwt = Arc::clone(&jwt);
            tokio::spawn(async move {
                let (stream, _) = listener.accept().await.unwrap();
                let token = bus.shutdown_token();
                let _ = handle_client(stream, bus, jwt, token).await;
            });
        }

        let mut client = TcpStream::connect(addr).await.unwrap();
        let handshake = HandshakePayload {
            version: PROTOCOL_VERSION,
            token: "garbage".into(),
            client_name: Some("test".into()),
        };
        let mut line = serde_json::to_vec(&handshake).unwrap();
        line.push(b'\n');
        client.write_all(&line).await.unwrap();

        let ack: HandshakeAck = serde_json::from_str(&read_line(&mut client).await).unwrap();
        assert!(!ack.success);
        assert!(ack.channels.is_empty());
    }
}
