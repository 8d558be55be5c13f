use crate::error::CaptureError;
use crate::media::{CaptureSource, LocalTrack};
use async_trait::async_trait;
use std::sync::Arc;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

/// Tracks produced by one user-media request. A request that yields no track at all is
/// reported as an error instead.
#[derive(Debug, Clone, Default)]
pub struct CaptureStream {
    pub audio: Option<Arc<LocalTrack>>,
    pub video: Option<Arc<LocalTrack>>,
}

impl CaptureStream {
    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }
}

/// Access to local capture hardware.
#[async_trait]
pub trait CaptureDevices: Send + Sync {
    /// Microphone and/or camera.
    async fn user_media(&self, constraints: MediaConstraints) -> Result<CaptureStream, CaptureError>;

    /// A screen or window picked by the user.
    async fn display_media(&self) -> Result<Arc<LocalTrack>, CaptureError>;
}

/// Devices backed by sample-fed tracks: the application pushes encoded Opus/VP8 frames
/// through [`LocalTrack::write_sample`].
#[derive(Debug, Clone)]
pub struct SampleDevices {
    stream_id: String,
    has_camera: bool,
}

impl SampleDevices {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            has_camera: true,
        }
    }

    /// A host without a camera: video requests degrade to audio only.
    pub fn without_camera(mut self) -> Self {
        self.has_camera = false;
        self
    }

    fn track(&self, source: CaptureSource) -> Arc<LocalTrack> {
        LocalTrack::new(source, codec_for(source), &self.stream_id)
    }
}

impl Default for SampleDevices {
    fn default() -> Self {
        Self::new("meshcall")
    }
}

#[async_trait]
impl CaptureDevices for SampleDevices {
    async fn user_media(&self, constraints: MediaConstraints) -> Result<CaptureStream, CaptureError> {
        let stream = CaptureStream {
            audio: constraints
                .audio
                .then(|| self.track(CaptureSource::Microphone)),
            video: (constraints.video && self.has_camera).then(|| self.track(CaptureSource::Camera)),
        };
        if stream.is_empty() {
            return Err(CaptureError::DeviceUnavailable("camera"));
        }
        Ok(stream)
    }

    async fn display_media(&self) -> Result<Arc<LocalTrack>, CaptureError> {
        Ok(self.track(CaptureSource::Screen))
    }
}

pub fn codec_for(source: CaptureSource) -> RTCRtpCodecCapability {
    match source {
        CaptureSource::Microphone => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        },
        CaptureSource::Camera | CaptureSource::Screen => RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90000,
            ..Default::default()
        },
    }
}
