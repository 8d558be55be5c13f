use crate::model::connection::ConnectionId;
use crate::model::ice::{IceCandidate, IceServerConfig};
use crate::model::peer::PeerInfo;
use crate::model::room::RoomKey;
use serde::{Deserialize, Serialize};

/// Negotiation payload exchanged between two peers. The server relays it untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SignalPayload {
    Offer(String),
    Answer(String),
    Ice(IceCandidate),
}

impl SignalPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            SignalPayload::Offer(_) => "offer",
            SignalPayload::Answer(_) => "answer",
            SignalPayload::Ice(_) => "ice",
        }
    }
}

/// Frames sent by a participant to the signaling server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        room: RoomKey,
        user_id: String,
        display_name: String,
    },
    Signal {
        room: RoomKey,
        to: ConnectionId,
        payload: SignalPayload,
    },
    Leave {
        room: RoomKey,
    },
}

/// Frames sent by the signaling server to a participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        connection_id: ConnectionId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    /// Bootstrap snapshot, sent only to the joiner.
    Peers {
        room: RoomKey,
        peers: Vec<PeerInfo>,
    },
    PeerJoined {
        room: RoomKey,
        peer: PeerInfo,
    },
    Signal {
        room: RoomKey,
        from: ConnectionId,
        payload: SignalPayload,
    },
    PeerLeft {
        room: RoomKey,
        connection_id: ConnectionId,
    },
}

impl ServerMessage {
    pub fn room(&self) -> Option<&RoomKey> {
        match self {
            ServerMessage::Peers { room, .. }
            | ServerMessage::PeerJoined { room, .. }
            | ServerMessage::Signal { room, .. }
            | ServerMessage::PeerLeft { room, .. } => Some(room),
            ServerMessage::Welcome { .. } | ServerMessage::IceConfig { .. } => None,
        }
    }
}
