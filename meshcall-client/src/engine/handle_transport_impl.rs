use crate::engine::{CallEvent, PeerSessionManager};
use crate::error::NegotiationError;
use crate::transport::TransportEvent;
use meshcall_core::SignalPayload;
use tracing::{debug, info};

impl PeerSessionManager {
    pub(super) async fn handle_transport_event(&mut self, event: TransportEvent) {
        let id = event.transport();
        let remote = id.remote;
        let live = self
            .sessions
            .get(&remote)
            .is_some_and(|s| s.transport_id() == id && !s.state().is_terminal());
        if !live {
            debug!("Dropping event from retired transport {}", id);
            return;
        }

        match event {
            TransportEvent::CandidateGenerated(_, candidate) => {
                self.send_signal(remote, SignalPayload::Ice(candidate));
            }

            TransportEvent::Connected(_) => {
                let Some(session) = self.sessions.get_mut(&remote) else {
                    return;
                };
                if session.mark_connected() {
                    info!("Media connected with {}", remote);
                    self.emit(CallEvent::PeerConnected(remote));
                }
            }

            TransportEvent::Failed(_) => {
                self.fail_session(remote, NegotiationError::ConnectivityLost(remote))
                    .await;
            }

            TransportEvent::RemoteTrack(_, track) => {
                let Some(session) = self.sessions.get_mut(&remote) else {
                    return;
                };
                session.push_remote_track(track.clone());
                self.emit(CallEvent::RemoteTrack {
                    connection_id: remote,
                    track,
                });
            }
        }
    }

    /// The screen capture was ended outside the application.
    pub(super) async fn on_screen_capture_ended(&mut self) {
        if !self.media.state().sharing_screen {
            return;
        }
        info!("Screen capture ended by the system");
        if self.media.stop_screen_share(&mut self.sessions).await.is_ok() {
            self.emit(CallEvent::ScreenShareStopped);
        }
    }
}
