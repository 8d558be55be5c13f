use crate::media::TrackKind;
use meshcall_core::{ConnectionId, IceCandidate};
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// A track received from a remote peer.
#[derive(Clone)]
pub struct RemoteTrack {
    pub kind: TrackKind,
    pub id: String,
    pub track: Arc<TrackRemote>,
}

impl std::fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

/// One transport instance toward a remote peer. The remote may leave and come back on
/// the same connection, so each new transport gets a fresh generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId {
    pub remote: ConnectionId,
    pub generation: u64,
}

impl TransportId {
    pub fn new(remote: ConnectionId, generation: u64) -> Self {
        Self { remote, generation }
    }
}

impl std::fmt::Display for TransportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.remote, self.generation)
    }
}

/// Events a media transport reports back to the session manager.
#[derive(Debug)]
pub enum TransportEvent {
    /// A local ICE candidate that must be relayed to the remote peer.
    CandidateGenerated(TransportId, IceCandidate),

    /// Media connectivity is established.
    Connected(TransportId),

    /// Connectivity failed or the session was closed underneath us.
    Failed(TransportId),

    RemoteTrack(TransportId, RemoteTrack),
}

impl TransportEvent {
    pub fn transport(&self) -> TransportId {
        match self {
            TransportEvent::CandidateGenerated(id, _)
            | TransportEvent::Connected(id)
            | TransportEvent::Failed(id)
            | TransportEvent::RemoteTrack(id, _) => *id,
        }
    }
}
