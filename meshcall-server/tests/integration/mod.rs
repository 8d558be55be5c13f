
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use meshcall_core::{ConnectionId, PeerInfo, ServerMessage};
use meshcall_server::RoomManager;

use crate::utils::MockSignalingOutput;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_registry() -> (
    RoomManager,
    MockSignalingOutput,
    mpsc::UnboundedReceiver<(ConnectionId, ServerMessage)>,
) {
    let (signaling, rx) = MockSignalingOutput::new();
    let rooms = RoomManager::new(Arc::new(signaling.clone()));
    (rooms, signaling, rx)
}

pub fn participant(user_id: &str) -> PeerInfo {
    PeerInfo {
        connection_id: ConnectionId::new(),
        user_id: user_id.to_owned(),
        display_name: format!("User {user_id}"),
    }
}
