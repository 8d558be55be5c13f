use crate::engine::CallCommand;
use crate::error::CallError;
use crate::media::{CallMode, LocalMediaState, LocalTracks};
use crate::session::PeerSnapshot;
use meshcall_core::{ConnectionId, RoomKey};
use tokio::sync::{mpsc, oneshot};

/// Cloneable front door to a running [`PeerSessionManager`](crate::PeerSessionManager).
#[derive(Clone)]
pub struct CallHandle {
    tx: mpsc::Sender<CallCommand>,
}

impl CallHandle {
    pub(crate) fn new(tx: mpsc::Sender<CallCommand>) -> Self {
        Self { tx }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> CallCommand,
    ) -> Result<T, CallError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| CallError::EngineStopped)?;
        rx.await.map_err(|_| CallError::EngineStopped)
    }

    /// Checks membership, acquires capture and sends `join`.
    pub async fn join(&self, room: RoomKey, mode: CallMode) -> Result<(), CallError> {
        self.request(|reply| CallCommand::Join { room, mode, reply })
            .await?
    }

    pub async fn leave(&self) -> Result<(), CallError> {
        self.request(|reply| CallCommand::Leave { reply }).await?
    }

    pub async fn set_muted(&self, muted: bool) -> Result<bool, CallError> {
        self.request(|reply| CallCommand::SetMuted {
            muted: Some(muted),
            reply,
        })
        .await?
    }

    /// Returns the new muted state.
    pub async fn toggle_mute(&self) -> Result<bool, CallError> {
        self.request(|reply| CallCommand::SetMuted { muted: None, reply })
            .await?
    }

    pub async fn set_camera_off(&self, off: bool) -> Result<bool, CallError> {
        self.request(|reply| CallCommand::SetCameraOff {
            off: Some(off),
            reply,
        })
        .await?
    }

    /// Returns the new camera-off state.
    pub async fn toggle_camera(&self) -> Result<bool, CallError> {
        self.request(|reply| CallCommand::SetCameraOff { off: None, reply })
            .await?
    }

    pub async fn start_screen_share(&self) -> Result<(), CallError> {
        self.request(|reply| CallCommand::StartScreenShare { reply })
            .await?
    }

    pub async fn stop_screen_share(&self) -> Result<(), CallError> {
        self.request(|reply| CallCommand::StopScreenShare { reply })
            .await?
    }

    pub async fn peers(&self) -> Result<Vec<PeerSnapshot>, CallError> {
        self.request(|reply| CallCommand::Peers { reply }).await
    }

    pub async fn media_state(&self) -> Result<LocalMediaState, CallError> {
        self.request(|reply| CallCommand::MediaState { reply }).await
    }

    pub async fn local_tracks(&self) -> Result<LocalTracks, CallError> {
        self.request(|reply| CallCommand::LocalTracks { reply }).await
    }

    /// Our own id as assigned by the server, once the greeting has arrived.
    pub async fn connection_id(&self) -> Result<Option<ConnectionId>, CallError> {
        self.request(|reply| CallCommand::ConnectionId { reply })
            .await
    }
}
