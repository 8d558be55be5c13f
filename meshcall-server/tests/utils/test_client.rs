use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use meshcall_core::{ClientMessage, ConnectionId, RoomKey, ServerMessage, SignalPayload};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::signal_helpers::{QUIET_PERIOD_MS, SIGNAL_TIMEOUT_MS};

/// A raw signaling participant speaking JSON frames over a real WebSocket.
pub struct TestClient {
    /// The connection id the server greeted us with.
    pub connection_id: ConnectionId,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect and consume the `welcome` + `ice_config` greeting.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (ws, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .context("Failed to connect")?;
        let mut client = Self {
            connection_id: ConnectionId::new(),
            ws,
        };

        match client.recv().await? {
            ServerMessage::Welcome { connection_id } => client.connection_id = connection_id,
            other => anyhow::bail!("Expected welcome, got {other:?}"),
        }
        match client.recv().await? {
            ServerMessage::IceConfig { .. } => {}
            other => anyhow::bail!("Expected ice_config, got {other:?}"),
        }
        Ok(client)
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.ws
            .send(Message::Text(json))
            .await
            .context("Failed to send frame")
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::Text(text.to_owned()))
            .await
            .context("Failed to send frame")
    }

    pub async fn join(&mut self, room: &RoomKey, user_id: &str, display_name: &str) -> Result<()> {
        self.send(&ClientMessage::Join {
            room: room.clone(),
            user_id: user_id.to_owned(),
            display_name: display_name.to_owned(),
        })
        .await
    }

    pub async fn signal(
        &mut self,
        room: &RoomKey,
        to: ConnectionId,
        payload: SignalPayload,
    ) -> Result<()> {
        self.send(&ClientMessage::Signal {
            room: room.clone(),
            to,
            payload,
        })
        .await
    }

    /// Receive the next server frame or fail after `SIGNAL_TIMEOUT_MS`.
    pub async fn recv(&mut self) -> Result<ServerMessage> {
        self.recv_within(SIGNAL_TIMEOUT_MS)
            .await?
            .context("Timeout waiting for frame")
    }

    /// `Ok(None)` when nothing arrives within `QUIET_PERIOD_MS`.
    pub async fn recv_quiet(&mut self) -> Result<Option<ServerMessage>> {
        self.recv_within(QUIET_PERIOD_MS).await
    }

    async fn recv_within(&mut self, timeout_ms: u64) -> Result<Option<ServerMessage>> {
        let timeout = std::time::Duration::from_millis(timeout_ms);
        loop {
            let next = match tokio::time::timeout(timeout, self.ws.next()).await {
                Ok(next) => next,
                Err(_) => return Ok(None),
            };
            match next {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(serde_json::from_str(&text).context("Bad server frame")?));
                }
                Some(Ok(Message::Close(_))) | None => anyhow::bail!("Connection closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close")?;
        Ok(())
    }
}
