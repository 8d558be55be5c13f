use crate::error::{CallError, CaptureError};
use crate::media::{CaptureDevices, LocalTrack, MediaConstraints};
use crate::session::PeerSessionTable;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallMode {
    #[default]
    Video,
    Voice,
}

impl CallMode {
    fn constraints(self) -> MediaConstraints {
        MediaConstraints {
            audio: true,
            video: self == CallMode::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalMediaState {
    pub mode: CallMode,
    pub muted: bool,
    pub camera_off: bool,
    pub sharing_screen: bool,
}

/// Tracks currently owned by the controller.
#[derive(Debug, Clone, Default)]
pub struct LocalTracks {
    pub audio: Option<Arc<LocalTrack>>,
    pub camera: Option<Arc<LocalTrack>>,
    pub screen: Option<Arc<LocalTrack>>,
}

/// Single owner of the local capture sources for the active call.
pub struct LocalMediaController {
    devices: Arc<dyn CaptureDevices>,
    tracks: LocalTracks,
    state: LocalMediaState,
    active: bool,
}

impl LocalMediaController {
    pub fn new(devices: Arc<dyn CaptureDevices>) -> Self {
        Self {
            devices,
            tracks: LocalTracks::default(),
            state: LocalMediaState::default(),
            active: false,
        }
    }

    /// Acquires microphone (and camera in video mode). Fails only when nothing at all
    /// could be captured.
    pub async fn start(&mut self, mode: CallMode) -> Result<(), CaptureError> {
        self.stop();

        let stream = self.devices.user_media(mode.constraints()).await?;
        if mode == CallMode::Video && stream.video.is_none() {
            warn!("Camera unavailable, continuing with audio only");
        }

        self.tracks = LocalTracks {
            audio: stream.audio,
            camera: stream.video,
            screen: None,
        };
        self.state = LocalMediaState {
            mode,
            ..Default::default()
        };
        self.active = true;
        info!("Local capture started in {:?} mode", mode);
        Ok(())
    }

    /// Releases every capture source.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        let tracks = std::mem::take(&mut self.tracks);
        for track in [tracks.audio, tracks.camera, tracks.screen].into_iter().flatten() {
            track.stop();
        }
        self.state = LocalMediaState::default();
        self.active = false;
        info!("Local capture stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> LocalMediaState {
        self.state
    }

    pub fn tracks(&self) -> LocalTracks {
        self.tracks.clone()
    }

    pub fn outgoing_audio(&self) -> Option<Arc<LocalTrack>> {
        self.tracks.audio.clone()
    }

    /// What a newly created session should send as video right now.
    pub fn outgoing_video(&self) -> Option<Arc<LocalTrack>> {
        self.tracks
            .screen
            .clone()
            .or_else(|| self.tracks.camera.clone())
    }

    /// Flips the shared audio track in place. Every session sees it at once.
    pub fn set_muted(&mut self, muted: bool) -> Result<bool, CallError> {
        if !self.active {
            return Err(CallError::NotInCall);
        }
        if let Some(audio) = &self.tracks.audio {
            audio.set_enabled(!muted);
        }
        self.state.muted = muted;
        debug!("Muted: {}", muted);
        Ok(muted)
    }

    /// Same as [`Self::set_muted`] for the camera. A no-op in voice mode.
    pub fn set_camera_off(&mut self, off: bool) -> Result<bool, CallError> {
        if !self.active {
            return Err(CallError::NotInCall);
        }
        if self.state.mode == CallMode::Voice {
            return Ok(self.state.camera_off);
        }
        if let Some(camera) = &self.tracks.camera {
            camera.set_enabled(!off);
        }
        self.state.camera_off = off;
        debug!("Camera off: {}", off);
        Ok(off)
    }

    /// Acquires the screen and substitutes it for the outgoing video of every session.
    pub async fn start_screen_share(&mut self, sessions: &mut PeerSessionTable) -> Result<(), CallError> {
        if !self.active {
            return Err(CallError::NotInCall);
        }
        // Sessions only carry a video sender when a camera track was attached at start.
        if self.tracks.camera.is_none() {
            return Err(CallError::NoVideoSender);
        }
        if self.state.sharing_screen {
            return Ok(());
        }

        let screen = self.devices.display_media().await?;
        self.tracks.screen = Some(screen.clone());
        self.state.sharing_screen = true;
        info!("Screen share started");

        sessions.replace_outgoing_video(&screen).await;
        Ok(())
    }

    /// Releases the screen and puts the camera back on every session. Also the handler
    /// for a share ended from outside the application.
    pub async fn stop_screen_share(&mut self, sessions: &mut PeerSessionTable) -> Result<(), CallError> {
        let Some(screen) = self.tracks.screen.take() else {
            return Ok(());
        };
        screen.stop();
        self.state.sharing_screen = false;
        info!("Screen share stopped");

        if let Some(camera) = self.tracks.camera.clone() {
            sessions.replace_outgoing_video(&camera).await;
        }
        Ok(())
    }

    /// Resolves once the current screen capture ends; pending forever while not sharing.
    pub fn screen_ended_signal(&self) -> Option<watch::Receiver<bool>> {
        self.tracks.screen.as_ref().map(|s| s.ended_signal())
    }
}
