use crate::error::NegotiationError;
use crate::media::LocalTrack;
use crate::transport::{MediaTransport, RemoteTrack, TransportId};
use meshcall_core::{ConnectionId, IceCandidate, PeerInfo, SignalPayload};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which side of a pair sends the first offer. The later joiner always initiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Negotiating,
    Connected,
    Failed,
    Closed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Failed | SessionState::Closed)
    }
}

/// Public view of a session for participant lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSnapshot {
    pub connection_id: ConnectionId,
    pub user_id: Option<String>,
    pub display_name: String,
    pub role: Role,
    pub state: SessionState,
    pub remote_tracks: usize,
}

/// Negotiation state for one remote peer.
///
/// Every transition is driven by the manager feeding it a signal or a transport event;
/// each call yields at most one outbound payload.
pub struct PeerSession {
    remote_id: ConnectionId,
    transport_id: TransportId,
    user_id: Option<String>,
    display_name: String,
    role: Role,
    state: SessionState,
    transport: Box<dyn MediaTransport>,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
    remote_tracks: Vec<RemoteTrack>,
}

impl PeerSession {
    /// Wraps a fresh transport and attaches the current local tracks to it.
    pub async fn open(
        transport_id: TransportId,
        role: Role,
        transport: Box<dyn MediaTransport>,
        audio: Option<Arc<LocalTrack>>,
        video: Option<Arc<LocalTrack>>,
    ) -> Result<Self, NegotiationError> {
        let remote_id = transport_id.remote;
        if let Err(e) = transport.attach_local_tracks(audio, video).await {
            let _ = transport.close().await;
            return Err(NegotiationError::transport(remote_id, "attaching local tracks", e));
        }

        Ok(Self {
            remote_id,
            transport_id,
            user_id: None,
            display_name: String::new(),
            role,
            state: SessionState::Created,
            transport,
            remote_description_set: false,
            pending_candidates: Vec::new(),
            remote_tracks: Vec::new(),
        })
    }

    pub fn remote_id(&self) -> ConnectionId {
        self.remote_id
    }

    /// The transport this session owns. Events tagged with any other id are stale.
    pub fn transport_id(&self) -> TransportId {
        self.transport_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Refreshes identity from a roster entry.
    pub fn update_info(&mut self, info: &PeerInfo) {
        self.user_id = Some(info.user_id.clone());
        self.display_name = info.display_name.clone();
    }

    pub fn snapshot(&self) -> PeerSnapshot {
        PeerSnapshot {
            connection_id: self.remote_id,
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
            state: self.state,
            remote_tracks: self.remote_tracks.len(),
        }
    }

    /// Initiators produce the first offer here; responders have nothing to do.
    pub async fn start(&mut self) -> Result<Option<SignalPayload>, NegotiationError> {
        if self.role != Role::Initiator || self.state != SessionState::Created {
            return Ok(None);
        }

        let offer = self
            .transport
            .create_offer()
            .await
            .map_err(|e| self.fail(e, "creating offer"))?;
        self.state = SessionState::Negotiating;
        info!("Sent offer to {}", self.remote_id);
        Ok(Some(SignalPayload::Offer(offer)))
    }

    /// Consumes one relayed payload. Returns the reply to send back, if any.
    pub async fn handle_signal(
        &mut self,
        payload: SignalPayload,
    ) -> Result<Option<SignalPayload>, NegotiationError> {
        if self.state.is_terminal() {
            debug!("Ignoring {} for closed session {}", payload.kind(), self.remote_id);
            return Ok(None);
        }

        match payload {
            SignalPayload::Offer(sdp) => {
                if self.role != Role::Responder || self.state != SessionState::Created {
                    warn!(
                        "Unexpected offer from {} (role {:?}, state {:?})",
                        self.remote_id, self.role, self.state
                    );
                    return Ok(None);
                }

                let answer = self
                    .transport
                    .accept_offer(sdp)
                    .await
                    .map_err(|e| self.fail(e, "applying offer"))?;
                self.remote_description_set = true;
                self.state = SessionState::Negotiating;
                self.flush_candidates().await;
                info!("Answered offer from {}", self.remote_id);
                Ok(Some(SignalPayload::Answer(answer)))
            }

            SignalPayload::Answer(sdp) => {
                if self.role != Role::Initiator
                    || self.state != SessionState::Negotiating
                    || self.remote_description_set
                {
                    warn!(
                        "Unexpected answer from {} (role {:?}, state {:?})",
                        self.remote_id, self.role, self.state
                    );
                    return Ok(None);
                }

                self.transport
                    .apply_answer(sdp)
                    .await
                    .map_err(|e| self.fail(e, "applying answer"))?;
                self.remote_description_set = true;
                self.flush_candidates().await;
                debug!("Applied answer from {}", self.remote_id);
                Ok(None)
            }

            SignalPayload::Ice(candidate) => {
                if !self.remote_description_set {
                    debug!("Queueing early ICE candidate from {}", self.remote_id);
                    self.pending_candidates.push(candidate);
                    return Ok(None);
                }
                self.add_candidate(candidate).await;
                Ok(None)
            }
        }
    }

    /// Transport reported connectivity. Returns `true` on the first transition.
    pub fn mark_connected(&mut self) -> bool {
        match self.state {
            SessionState::Created | SessionState::Negotiating => {
                self.state = SessionState::Connected;
                true
            }
            _ => false,
        }
    }

    pub fn mark_failed(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Failed;
        }
    }

    pub fn push_remote_track(&mut self, track: RemoteTrack) {
        self.remote_tracks.push(track);
    }

    pub async fn replace_outgoing_video(&self, track: &Arc<LocalTrack>) {
        if self.state.is_terminal() {
            return;
        }
        if let Err(e) = self.transport.replace_video_track(track.clone()).await {
            warn!("Failed to replace outgoing video for {}: {:#}", self.remote_id, e);
        }
    }

    /// Tears the transport down. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.pending_candidates.clear();
        self.remote_tracks.clear();
        if let Err(e) = self.transport.close().await {
            debug!("Error while closing transport to {}: {:#}", self.remote_id, e);
        }
    }

    async fn flush_candidates(&mut self) {
        for candidate in std::mem::take(&mut self.pending_candidates) {
            self.add_candidate(candidate).await;
        }
    }

    async fn add_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.transport.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {:#}", self.remote_id, e);
        }
    }

    fn fail(&mut self, err: anyhow::Error, step: &'static str) -> NegotiationError {
        self.state = SessionState::Failed;
        NegotiationError::transport(self.remote_id, step, err)
    }
}
