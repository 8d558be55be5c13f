use crate::media::LocalTrack;
use crate::session::{PeerSession, PeerSnapshot};
use meshcall_core::ConnectionId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Sessions of the current call keyed by remote connection, plus tombstones for the
/// ones already closed so late signals from them can be recognised and dropped.
#[derive(Default)]
pub struct PeerSessionTable {
    sessions: HashMap<ConnectionId, PeerSession>,
    closed: HashSet<ConnectionId>,
}

impl PeerSessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session. The table never holds two sessions for the same remote, so
    /// an existing one is handed back for the caller to close.
    pub fn insert(&mut self, session: PeerSession) -> Option<PeerSession> {
        let id = session.remote_id();
        self.closed.remove(&id);
        self.sessions.insert(id, session)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&PeerSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut PeerSession> {
        self.sessions.get_mut(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Removes the session and leaves a tombstone for its remote id.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<PeerSession> {
        let session = self.sessions.remove(id)?;
        self.closed.insert(*id);
        Some(session)
    }

    pub fn is_closed(&self, id: &ConnectionId) -> bool {
        self.closed.contains(id)
    }

    /// The remote announced itself again; signals from it are welcome once more.
    pub fn revive(&mut self, id: &ConnectionId) {
        self.closed.remove(id);
    }

    /// Sessions of the same user under other connections, i.e. left behind by a reload.
    pub fn stale_sessions_of(&self, user_id: &str, except: &ConnectionId) -> Vec<ConnectionId> {
        self.sessions
            .values()
            .filter(|s| s.user_id() == Some(user_id) && &s.remote_id() != except)
            .map(|s| s.remote_id())
            .collect()
    }

    /// Empties the table for a new call, forgetting tombstones too.
    pub fn drain(&mut self) -> Vec<PeerSession> {
        self.closed.clear();
        self.sessions.drain().map(|(_, s)| s).collect()
    }

    pub async fn replace_outgoing_video(&self, track: &Arc<LocalTrack>) {
        for session in self.sessions.values() {
            session.replace_outgoing_video(track).await;
        }
    }

    pub fn snapshots(&self) -> Vec<PeerSnapshot> {
        let mut list: Vec<_> = self.sessions.values().map(|s| s.snapshot()).collect();
        list.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        list
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
