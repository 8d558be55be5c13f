use crate::engine::{CallCommand, CallEndReason, PeerSessionManager};
use crate::error::CallError;
use crate::media::CallMode;
use meshcall_core::{ClientMessage, RoomKey};
use tracing::info;

impl PeerSessionManager {
    pub(super) async fn handle_command(&mut self, cmd: CallCommand) {
        match cmd {
            CallCommand::Join { room, mode, reply } => {
                let result = self.join(room, mode).await;
                let _ = reply.send(result);
            }

            CallCommand::Leave { reply } => {
                let result = if self.room.is_some() {
                    self.end_call(CallEndReason::Left, true).await;
                    Ok(())
                } else {
                    Err(CallError::NotInCall)
                };
                let _ = reply.send(result);
            }

            CallCommand::SetMuted { muted, reply } => {
                let muted = muted.unwrap_or(!self.media.state().muted);
                let _ = reply.send(self.media.set_muted(muted));
            }

            CallCommand::SetCameraOff { off, reply } => {
                let off = off.unwrap_or(!self.media.state().camera_off);
                let _ = reply.send(self.media.set_camera_off(off));
            }

            CallCommand::StartScreenShare { reply } => {
                let result = self.media.start_screen_share(&mut self.sessions).await;
                let _ = reply.send(result);
            }

            CallCommand::StopScreenShare { reply } => {
                let result = self.media.stop_screen_share(&mut self.sessions).await;
                let _ = reply.send(result);
            }

            CallCommand::Peers { reply } => {
                let _ = reply.send(self.sessions.snapshots());
            }

            CallCommand::MediaState { reply } => {
                let _ = reply.send(self.media.state());
            }

            CallCommand::LocalTracks { reply } => {
                let _ = reply.send(self.media.tracks());
            }

            CallCommand::ConnectionId { reply } => {
                let _ = reply.send(self.local_id);
            }
        }
    }

    async fn join(&mut self, room: RoomKey, mode: CallMode) -> Result<(), CallError> {
        if let Some(current) = &self.room {
            return Err(CallError::AlreadyInCall(current.clone()));
        }
        if room.is_empty() {
            return Err(CallError::AdmissionDenied(room));
        }

        let identity = self.membership.current_identity().await?;
        if !self.membership.can_join(&identity, &room).await? {
            return Err(CallError::AdmissionDenied(room));
        }

        self.media.start(mode).await?;

        let join = ClientMessage::Join {
            room: room.clone(),
            user_id: identity.user_id,
            display_name: identity.display_name.clone(),
        };
        if let Err(e) = self.signal.send(join) {
            self.media.stop();
            return Err(e);
        }

        info!("Joining {} as {}", room, identity.display_name);
        self.room = Some(room);
        Ok(())
    }
}
