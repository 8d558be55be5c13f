use meshcall_core::{ConnectionId, ServerMessage};

/// Outbound side of the signal transport. The room registry pushes notifications
/// and relayed signals through it while holding a room's guard, so implementations
/// must not block.
pub trait SignalingOutput: Send + Sync {
    /// Queue `msg` for the connection `to`. Unknown connections are ignored.
    fn deliver(&self, to: &ConnectionId, msg: ServerMessage);
}
