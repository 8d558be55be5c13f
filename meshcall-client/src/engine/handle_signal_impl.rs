use crate::engine::{CallEndReason, CallEvent, PeerSessionManager};
use crate::session::Role;
use meshcall_core::{ConnectionId, PeerInfo, RoomKey, ServerMessage, SignalPayload};
use tracing::{debug, info, warn};

impl PeerSessionManager {
    pub(super) async fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Welcome { connection_id } => {
                info!("Signaling assigned connection id {}", connection_id);
                self.local_id = Some(connection_id);
                self.emit(CallEvent::Connected { connection_id });
            }

            ServerMessage::IceConfig { ice_servers } => {
                if ice_servers.is_empty() {
                    debug!("Empty ICE config, keeping current servers");
                    return;
                }
                info!("Received ICE config: {} servers", ice_servers.len());
                self.ice_servers = ice_servers;
            }

            ServerMessage::Peers { room, peers } => {
                if !self.in_room(&room) {
                    return;
                }
                info!("Bootstrap list for {}: {} peers", room, peers.len());
                for peer in peers {
                    self.on_peer_present(peer, Role::Initiator).await;
                }
            }

            ServerMessage::PeerJoined { room, peer } => {
                if !self.in_room(&room) {
                    return;
                }
                self.on_peer_present(peer, Role::Responder).await;
            }

            ServerMessage::Signal {
                room,
                from,
                payload,
            } => {
                if !self.in_room(&room) {
                    return;
                }
                self.on_signal(from, payload).await;
            }

            ServerMessage::PeerLeft {
                room,
                connection_id,
            } => {
                if !self.in_room(&room) {
                    return;
                }
                if Some(connection_id) == self.local_id {
                    warn!("Removed from {} by a newer connection of this user", room);
                    self.end_call(CallEndReason::Evicted, false).await;
                    return;
                }
                self.close_session(connection_id).await;
            }
        }
    }

    fn in_room(&self, room: &RoomKey) -> bool {
        if self.room.as_ref() == Some(room) {
            return true;
        }
        debug!("Dropping message for {}, not in that call", room);
        false
    }

    /// A roster entry: the bootstrap list (we initiate) or a `peer_joined` (we wait).
    async fn on_peer_present(&mut self, peer: PeerInfo, role: Role) {
        if Some(peer.connection_id) == self.local_id {
            return;
        }
        self.sessions.revive(&peer.connection_id);

        for stale in self
            .sessions
            .stale_sessions_of(&peer.user_id, &peer.connection_id)
        {
            info!(
                "{} replaces {} for user {}",
                peer.connection_id, stale, peer.user_id
            );
            self.close_session(stale).await;
        }

        if let Some(session) = self.sessions.get_mut(&peer.connection_id) {
            session.update_info(&peer);
            return;
        }
        self.open_session(peer.connection_id, Some(&peer), role)
            .await;
    }

    async fn on_signal(&mut self, from: ConnectionId, payload: SignalPayload) {
        if self.sessions.is_closed(&from) {
            debug!("Dropping stale {} from closed session {}", payload.kind(), from);
            return;
        }

        if !self.sessions.contains(&from) {
            if !matches!(payload, SignalPayload::Offer(_)) {
                debug!("Dropping {} from unknown peer {}", payload.kind(), from);
                return;
            }
            info!("Offer from {} ahead of its roster entry, answering", from);
            if !self.open_session(from, None, Role::Responder).await {
                return;
            }
        }

        let Some(session) = self.sessions.get_mut(&from) else {
            return;
        };
        match session.handle_signal(payload).await {
            Ok(Some(reply)) => self.send_signal(from, reply),
            Ok(None) => {}
            Err(e) => self.fail_session(from, e).await,
        }
    }
}
