use meshcall_core::{ConnectionId, ServerMessage};
use meshcall_server::SignalingOutput;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Mock SignalingOutput that captures all deliveries.
#[derive(Clone)]
pub struct MockSignalingOutput {
    /// Channel to send captured deliveries.
    tx: mpsc::UnboundedSender<(ConnectionId, ServerMessage)>,
    /// All captured deliveries (for verification).
    delivered: Arc<Mutex<Vec<(ConnectionId, ServerMessage)>>>,
}

impl MockSignalingOutput {
    /// Create a new MockSignalingOutput and its receiver channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(ConnectionId, ServerMessage)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signaling = Self {
            tx,
            delivered: Arc::new(Mutex::new(Vec::new())),
        };
        (signaling, rx)
    }

    /// Everything delivered to `to`, in delivery order.
    pub fn delivered_to(&self, to: &ConnectionId) -> Vec<ServerMessage> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == to)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

impl SignalingOutput for MockSignalingOutput {
    fn deliver(&self, to: &ConnectionId, msg: ServerMessage) {
        tracing::debug!("[MockSignaling] deliver to {}", to);

        self.delivered.lock().unwrap().push((*to, msg.clone()));
        let _ = self.tx.send((*to, msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshcall_core::RoomKey;

    #[test]
    fn test_mock_signaling_captures_delivery() {
        let (signaling, mut rx) = MockSignalingOutput::new();
        let to = ConnectionId::new();
        let msg = ServerMessage::PeerLeft {
            room: RoomKey::from("call:1"),
            connection_id: ConnectionId::new(),
        };

        signaling.deliver(&to, msg.clone());

        assert_eq!(rx.try_recv().unwrap(), (to, msg.clone()));
        assert_eq!(signaling.delivered_to(&to), vec![msg]);
        assert_eq!(signaling.total(), 1);
    }
}
