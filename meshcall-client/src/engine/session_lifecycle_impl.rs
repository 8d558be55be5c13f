use crate::engine::{CallEndReason, CallEvent, PeerSessionManager};
use crate::error::NegotiationError;
use crate::session::{PeerSession, Role};
use crate::transport::{TransportConfig, TransportId};
use meshcall_core::{ClientMessage, ConnectionId, PeerInfo, SignalPayload};
use tracing::{debug, info, warn};

impl PeerSessionManager {
    /// Creates the session for `remote` with the current local media attached and, for
    /// an initiator, sends the first offer. Returns `false` if the session did not survive.
    pub(super) async fn open_session(
        &mut self,
        remote: ConnectionId,
        info: Option<&PeerInfo>,
        role: Role,
    ) -> bool {
        self.transport_generation += 1;
        let id = TransportId::new(remote, self.transport_generation);
        let config = TransportConfig {
            ice_servers: self.ice_servers.clone(),
        };
        let transport = match self
            .transports
            .create(id, config, self.transport_tx.clone())
            .await
        {
            Ok(t) => t,
            Err(e) => {
                self.report_failure(NegotiationError::transport(remote, "creating transport", e));
                return false;
            }
        };

        let opened = PeerSession::open(
            id,
            role,
            transport,
            self.media.outgoing_audio(),
            self.media.outgoing_video(),
        )
        .await;
        let mut session = match opened {
            Ok(s) => s,
            Err(e) => {
                self.report_failure(e);
                return false;
            }
        };
        if let Some(info) = info {
            session.update_info(info);
        }

        info!("Opened {:?} session with {}", role, remote);
        self.emit(CallEvent::PeerJoined(session.snapshot()));
        if let Some(mut previous) = self.sessions.insert(session) {
            previous.close().await;
        }

        let started = match self.sessions.get_mut(&remote) {
            Some(session) => session.start().await,
            None => return false,
        };
        match started {
            Ok(Some(offer)) => {
                self.send_signal(remote, offer);
                true
            }
            Ok(None) => true,
            Err(e) => {
                self.fail_session(remote, e).await;
                false
            }
        }
    }

    /// The remote left on purpose: close quietly.
    pub(super) async fn close_session(&mut self, remote: ConnectionId) {
        let Some(mut session) = self.sessions.remove(&remote) else {
            debug!("No session with {} to close", remote);
            return;
        };
        session.close().await;
        info!("Session with {} closed", remote);
        self.emit(CallEvent::PeerLeft(remote));
    }

    /// Failed → Closed. Reported once; the other sessions carry on.
    pub(super) async fn fail_session(&mut self, remote: ConnectionId, error: NegotiationError) {
        let Some(mut session) = self.sessions.remove(&remote) else {
            return;
        };
        session.mark_failed();
        session.close().await;
        self.report_failure(error);
    }

    fn report_failure(&self, error: NegotiationError) {
        let connection_id = match &error {
            NegotiationError::Transport { remote, .. } => *remote,
            NegotiationError::ConnectivityLost(remote) => *remote,
        };
        warn!("Session with {} failed: {}", connection_id, error);
        self.emit(CallEvent::PeerFailed {
            connection_id,
            error,
        });
    }

    /// Closes every session and releases capture. `notify_server` sends `leave`.
    pub(super) async fn end_call(&mut self, reason: CallEndReason, notify_server: bool) {
        let Some(room) = self.room.take() else {
            return;
        };

        for mut session in self.sessions.drain() {
            session.close().await;
        }
        self.media.stop();

        if notify_server {
            if let Err(e) = self.signal.send(ClientMessage::Leave { room: room.clone() }) {
                debug!("Could not send leave for {}: {}", room, e);
            }
        }

        info!("Call {} ended: {:?}", room, reason);
        self.emit(CallEvent::CallEnded { room, reason });
    }

    pub(super) fn send_signal(&self, to: ConnectionId, payload: SignalPayload) {
        let Some(room) = self.room.clone() else {
            return;
        };
        debug!("Sending {} to {}", payload.kind(), to);
        if let Err(e) = self.signal.send(ClientMessage::Signal { room, to, payload }) {
            warn!("Failed to send signal to {}: {}", to, e);
        }
    }
}
