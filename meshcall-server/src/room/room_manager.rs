use crate::room::CallRoom;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use meshcall_core::{ConnectionId, PeerInfo, RoomKey, ServerMessage, SignalPayload};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Authoritative membership of every call room.
///
/// Each operation holds the room's map entry for its whole duration, so operations on
/// one room are linearized while different rooms proceed in parallel. Notifications
/// are emitted under that guard, which keeps every member's view of one room ordered.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomKey, CallRoom>>,
    memberships: Arc<DashMap<ConnectionId, HashSet<RoomKey>>>,
    signaling: Arc<dyn SignalingOutput>,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            memberships: Arc::new(DashMap::new()),
            signaling,
        }
    }

    /// Adds `peer` to `room` and returns everyone who was already there.
    ///
    /// Existing members get `peer_joined`. A repeated join from the same connection only
    /// refreshes the entry. Another connection of the same user is evicted first.
    pub fn join(&self, room: &RoomKey, peer: PeerInfo) -> Vec<PeerInfo> {
        let mut entry = self.rooms.entry(room.clone()).or_insert_with(|| {
            info!("Creating call room {}", room);
            CallRoom::new()
        });
        let call_room = entry.value_mut();

        for stale in call_room.stale_connections_of(&peer.user_id, &peer.connection_id) {
            info!(
                "Evicting stale connection {} of user {} from {}",
                stale, peer.user_id, room
            );
            call_room.remove(&stale);
            self.forget_membership(&stale, room);

            let left = ServerMessage::PeerLeft {
                room: room.clone(),
                connection_id: stale,
            };
            // The stale connection hears about its own removal too.
            self.signaling.deliver(&stale, left.clone());
            for member in call_room.connection_ids() {
                self.signaling.deliver(member, left.clone());
            }
        }

        let existing = call_room.others(&peer.connection_id);
        let is_new = call_room.insert(peer.clone());
        self.memberships
            .entry(peer.connection_id)
            .or_default()
            .insert(room.clone());

        if is_new {
            info!(
                "{} ({}) joined {} with {} peers present",
                peer.connection_id,
                peer.user_id,
                room,
                existing.len()
            );
            let joined = ServerMessage::PeerJoined {
                room: room.clone(),
                peer,
            };
            for member in &existing {
                self.signaling.deliver(&member.connection_id, joined.clone());
            }
        } else {
            debug!("{} re-joined {}, refreshing entry", peer.connection_id, room);
        }

        existing
    }

    /// Removes the connection from `room`, notifies the remaining members and drops the
    /// room once it is empty. Returns `false` when the connection was not a member.
    pub fn leave(&self, room: &RoomKey, connection_id: &ConnectionId) -> bool {
        {
            let Some(mut entry) = self.rooms.get_mut(room) else {
                return false;
            };
            if entry.remove(connection_id).is_none() {
                return false;
            }
            self.forget_membership(connection_id, room);

            info!("{} left {}", connection_id, room);
            let left = ServerMessage::PeerLeft {
                room: room.clone(),
                connection_id: *connection_id,
            };
            for member in entry.connection_ids() {
                self.signaling.deliver(member, left.clone());
            }
        }

        if self.rooms.remove_if(room, |_, r| r.is_empty()).is_some() {
            info!("Call room {} is empty, discarding", room);
        }
        true
    }

    /// Leaves every room the connection is in. Used when its channel drops.
    pub fn disconnect(&self, connection_id: &ConnectionId) {
        let Some((_, rooms)) = self.memberships.remove(connection_id) else {
            return;
        };
        for room in rooms {
            self.leave(&room, connection_id);
        }
    }

    /// Forwards `payload` to `to` if both ends are members of `room`. Anything else is a
    /// leave/negotiation race and is dropped silently.
    pub fn route_signal(
        &self,
        room: &RoomKey,
        from: &ConnectionId,
        to: &ConnectionId,
        payload: SignalPayload,
    ) -> bool {
        let Some(entry) = self.rooms.get(room) else {
            debug!("Dropping {} for unknown room {}", payload.kind(), room);
            return false;
        };
        if from == to || !entry.contains(from) || !entry.contains(to) {
            debug!(
                "Dropping {} from {} to {} in {}: not both present",
                payload.kind(),
                from,
                to,
                room
            );
            return false;
        }

        debug!("Relaying {} from {} to {} in {}", payload.kind(), from, to, room);
        self.signaling.deliver(
            to,
            ServerMessage::Signal {
                room: room.clone(),
                from: *from,
                payload,
            },
        );
        true
    }

    pub fn participants(&self, room: &RoomKey) -> Vec<PeerInfo> {
        self.rooms
            .get(room)
            .map(|entry| entry.list())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomKey> {
        self.memberships
            .get(connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn forget_membership(&self, connection_id: &ConnectionId, room: &RoomKey) {
        if let Some(mut rooms) = self.memberships.get_mut(connection_id) {
            rooms.remove(room);
        }
        self.memberships
            .remove_if(connection_id, |_, rooms| rooms.is_empty());
    }
}
