mod connection;
mod ice;
mod peer;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use ice::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, IceCandidate, IceServerConfig};
pub use peer::PeerInfo;
pub use room::RoomKey;
pub use signaling::{ClientMessage, ServerMessage, SignalPayload};
