use crate::room::RoomManager;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use meshcall_core::{ClientMessage, ConnectionId, IceServerConfig, PeerInfo, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct SignalingInner {
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl SignalingOutput for SignalingInner {
    fn deliver(&self, to: &ConnectionId, msg: ServerMessage) {
        let Some(peer) = self.peers.get(to) else {
            debug!("Attempted to signal disconnected connection {}", to);
            return;
        };
        if peer.send(msg).is_err() {
            warn!("Outbound queue of {} is closed", to);
        }
    }
}

/// Signal relay: owns the live connections and feeds their requests into the room registry.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    rooms: RoomManager,
    ice_servers: Arc<Vec<IceServerConfig>>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        let inner = Arc::new(SignalingInner {
            peers: DashMap::new(),
        });
        let rooms = RoomManager::new(inner.clone());

        Self {
            inner,
            rooms,
            ice_servers: Arc::new(ice_servers),
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.ice_servers.as_ref().clone()
    }

    /// Registers a new channel and greets it with its connection id and the ICE server list.
    pub fn add_peer(&self, tx: mpsc::UnboundedSender<ServerMessage>) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.inner.peers.insert(connection_id, tx);

        self.inner
            .deliver(&connection_id, ServerMessage::Welcome { connection_id });
        self.inner.deliver(
            &connection_id,
            ServerMessage::IceConfig {
                ice_servers: self.get_ice_servers(),
            },
        );
        connection_id
    }

    /// Channel loss: the connection leaves every room it was in.
    pub fn remove_peer(&self, connection_id: &ConnectionId) {
        self.rooms.disconnect(connection_id);
        self.inner.peers.remove(connection_id);
        info!("Connection {} removed", connection_id);
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.inner.peers.contains_key(connection_id)
    }

    pub fn handle_text(&self, from: ConnectionId, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle_message(from, msg),
            Err(e) => warn!("Invalid ClientMessage from {}: {}", from, e),
        }
    }

    pub fn handle_message(&self, from: ConnectionId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join {
                room,
                user_id,
                display_name,
            } => {
                if room.is_empty() {
                    warn!("Join without room from {}", from);
                    return;
                }
                let peers = self.rooms.join(
                    &room,
                    PeerInfo {
                        connection_id: from,
                        user_id,
                        display_name,
                    },
                );
                self.inner
                    .deliver(&from, ServerMessage::Peers { room, peers });
            }

            ClientMessage::Signal { room, to, payload } => {
                if room.is_empty() {
                    return;
                }
                self.rooms.route_signal(&room, &from, &to, payload);
            }

            ClientMessage::Leave { room } => {
                if room.is_empty() {
                    return;
                }
                self.rooms.leave(&room, &from);
            }
        }
    }
}
