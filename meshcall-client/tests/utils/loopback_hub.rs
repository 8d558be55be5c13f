use async_trait::async_trait;
use meshcall_client::{
    CallError, CallEvent, CallHandle, CaptureDevices, CaptureError, CaptureStream, LocalIdentity,
    LocalTrack, ManagerParts, MediaConstraints, Membership, PeerSessionManager, PeerSnapshot,
    SampleDevices, SessionState, SignalSink, StaticMembership,
};
use meshcall_core::{ClientMessage, ConnectionId, IceServerConfig, RoomKey, ServerMessage};
use meshcall_server::SignalingService;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::call_helpers::{CALL_TIMEOUT_MS, wait_until};
use super::mock_transport::{MockTransportFactory, TransportLog};

/// Feeds a participant's outbound messages straight into the relay.
struct HubSink {
    service: SignalingService,
    id: ConnectionId,
}

impl SignalSink for HubSink {
    fn send(&self, msg: ClientMessage) -> Result<(), CallError> {
        self.service.handle_message(self.id, msg);
        Ok(())
    }
}

/// In-memory stand-in for the WebSocket: several call engines on one relay.
pub struct LoopbackHub {
    pub service: SignalingService,
}

pub struct ParticipantOptions {
    pub devices: Arc<dyn CaptureDevices>,
    pub membership: Option<Arc<dyn Membership>>,
    pub fail_connectivity: bool,
}

impl Default for ParticipantOptions {
    fn default() -> Self {
        Self {
            devices: Arc::new(SampleDevices::default()),
            membership: None,
            fail_connectivity: false,
        }
    }
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self {
            service: SignalingService::new(IceServerConfig::default_stun()),
        }
    }

    pub fn participant(&self, user_id: &str) -> Participant {
        self.participant_with(user_id, ParticipantOptions::default())
    }

    pub fn participant_with(&self, user_id: &str, options: ParticipantOptions) -> Participant {
        let (tx, inbound) = mpsc::unbounded_channel();
        let id = self.service.add_peer(tx.clone());

        let factory = MockTransportFactory::new(options.fail_connectivity);
        let transports = factory.log.clone();
        let membership: Arc<dyn Membership> = match options.membership {
            Some(membership) => membership,
            None => Arc::new(StaticMembership::new(user_id, user_id.to_uppercase())),
        };

        let (handle, events) = PeerSessionManager::spawn(ManagerParts {
            signal: Arc::new(HubSink {
                service: self.service.clone(),
                id,
            }),
            inbound,
            transports: Arc::new(factory),
            devices: options.devices,
            membership,
            ice_servers: IceServerConfig::default_stun(),
        });

        Participant {
            id,
            handle,
            events,
            transports,
            inject: tx,
        }
    }

    /// Drops the participant's channel as if the socket died.
    pub fn disconnect(&self, participant: &Participant) {
        self.service.remove_peer(&participant.id);
    }

    pub fn members(&self, room: &RoomKey) -> Vec<ConnectionId> {
        self.service
            .rooms()
            .participants(room)
            .into_iter()
            .map(|p| p.connection_id)
            .collect()
    }
}

pub struct Participant {
    pub id: ConnectionId,
    pub handle: CallHandle,
    pub events: mpsc::UnboundedReceiver<CallEvent>,
    pub transports: Arc<TransportLog>,
    inject: mpsc::UnboundedSender<ServerMessage>,
}

impl Participant {
    /// Delivers `msg` as if the relay had sent it.
    pub fn inject(&self, msg: ServerMessage) {
        self.inject.send(msg).unwrap();
    }

    pub async fn peers(&self) -> Vec<PeerSnapshot> {
        self.handle.peers().await.unwrap()
    }

    pub async fn peer(&self, remote: &Participant) -> Option<PeerSnapshot> {
        self.peers()
            .await
            .into_iter()
            .find(|p| p.connection_id == remote.id)
    }

    /// Waits until exactly `n` sessions exist and all of them are connected.
    pub async fn wait_for_connected(&self, n: usize) {
        let handle = self.handle.clone();
        let reached = wait_until(CALL_TIMEOUT_MS, || {
            let handle = handle.clone();
            async move {
                let peers = handle.peers().await.unwrap();
                peers.len() == n && peers.iter().all(|p| p.state == SessionState::Connected)
            }
        })
        .await;
        assert!(reached, "expected {n} connected sessions, have {:?}", self.peers().await);
    }

    pub async fn wait_for_peer_count(&self, n: usize) {
        let handle = self.handle.clone();
        let reached = wait_until(CALL_TIMEOUT_MS, || {
            let handle = handle.clone();
            async move { handle.peers().await.unwrap().len() == n }
        })
        .await;
        assert!(reached, "expected {n} sessions, have {:?}", self.peers().await);
    }

    /// Next event satisfying `pred`, skipping the others.
    pub async fn expect_event<F>(&mut self, mut pred: F) -> CallEvent
    where
        F: FnMut(&CallEvent) -> bool,
    {
        let deadline = tokio::time::Instant::now()
            + std::time::Duration::from_millis(CALL_TIMEOUT_MS);
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .expect("timed out waiting for call event")
                .expect("call engine stopped");
            if pred(&event) {
                return event;
            }
        }
    }
}

/// Capture that is always refused.
pub struct DeniedDevices;

#[async_trait]
impl CaptureDevices for DeniedDevices {
    async fn user_media(&self, _constraints: MediaConstraints) -> Result<CaptureStream, CaptureError> {
        Err(CaptureError::PermissionDenied("microphone"))
    }

    async fn display_media(&self) -> Result<Arc<LocalTrack>, CaptureError> {
        Err(CaptureError::PermissionDenied("screen"))
    }
}

/// Membership that admits nobody.
pub struct ClosedDoor;

#[async_trait]
impl Membership for ClosedDoor {
    async fn current_identity(&self) -> Result<LocalIdentity, CallError> {
        Ok(LocalIdentity {
            user_id: "outsider".into(),
            display_name: "Outsider".into(),
        })
    }

    async fn can_join(&self, _identity: &LocalIdentity, _room: &RoomKey) -> Result<bool, CallError> {
        Ok(false)
    }
}
