use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use meshcall_core::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, warn};

/// Both halves of a live signaling connection.
pub struct SignalChannel {
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

/// Opens the WebSocket and runs one writer and one reader task over it. The inbound
/// receiver yields `None` once the socket is gone.
pub async fn connect_signaling(url: &str) -> Result<SignalChannel> {
    let (ws, _) = connect_async(url)
        .await
        .with_context(|| format!("Failed to connect to signaling server at {url}"))?;
    info!("Connected to signaling server at {}", url);

    let (mut sender, mut receiver) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientMessage>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerMessage>();

    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to encode ClientMessage: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(parsed) => {
                        if in_tx.send(parsed).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid ServerMessage: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        debug!("Signaling socket closed");
    });

    Ok(SignalChannel {
        outbound: out_tx,
        inbound: in_rx,
    })
}
