use meshcall_core::{ConnectionId, PeerInfo};
use std::collections::HashMap;

/// Membership of a single call room. Pure bookkeeping, no media.
#[derive(Debug, Default)]
pub struct CallRoom {
    participants: HashMap<ConnectionId, PeerInfo>,
}

impl CallRoom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes a participant. Returns `true` when the connection was not present yet.
    pub fn insert(&mut self, peer: PeerInfo) -> bool {
        self.participants.insert(peer.connection_id, peer).is_none()
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<PeerInfo> {
        self.participants.remove(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.participants.contains_key(connection_id)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&PeerInfo> {
        self.participants.get(connection_id)
    }

    /// Everyone except `connection_id`; this is the bootstrap list handed to a joiner.
    pub fn others(&self, connection_id: &ConnectionId) -> Vec<PeerInfo> {
        self.participants
            .values()
            .filter(|p| &p.connection_id != connection_id)
            .cloned()
            .collect()
    }

    /// Connections registered under `user_id` other than `except`.
    pub fn stale_connections_of(&self, user_id: &str, except: &ConnectionId) -> Vec<ConnectionId> {
        self.participants
            .values()
            .filter(|p| p.user_id == user_id && &p.connection_id != except)
            .map(|p| p.connection_id)
            .collect()
    }

    pub fn connection_ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.participants.keys()
    }

    pub fn list(&self) -> Vec<PeerInfo> {
        self.participants.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
