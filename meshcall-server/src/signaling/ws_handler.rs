use crate::SignalingService;
use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use meshcall_core::ServerMessage;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Signaling routes: `/ws` for participants and `/health` for probes.
pub fn router(service: SignalingService, max_message_bytes: usize) -> Router {
    Router::new()
        .route(
            "/ws",
            get(move |ws: WebSocketUpgrade, state: State<SignalingService>| {
                ws_handler(ws.max_message_size(max_message_bytes), state)
            }),
        )
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection_id = service.add_peer(tx);
    info!("New WebSocket connection: {}", connection_id);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => service.handle_text(connection_id, text.as_str()),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
            // A request still in flight must land before the cleanup below, not after it.
            let _ = recv_task.await;
        }
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_peer(&connection_id);
    info!("WebSocket disconnected: {}", connection_id);
}
