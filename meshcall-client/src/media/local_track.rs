use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use uuid::Uuid;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Where a local track's samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureSource {
    Microphone,
    Camera,
    Screen,
}

impl CaptureSource {
    pub fn kind(self) -> TrackKind {
        match self {
            CaptureSource::Microphone => TrackKind::Audio,
            CaptureSource::Camera | CaptureSource::Screen => TrackKind::Video,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CaptureSource::Microphone => "microphone",
            CaptureSource::Camera => "camera",
            CaptureSource::Screen => "screen",
        }
    }
}

/// A captured track shared by every peer session of the call.
///
/// Muting and camera-off flip `enabled`; the RTP sender keeps the same track and simply
/// receives nothing while it is disabled, so no session is renegotiated.
pub struct LocalTrack {
    source: CaptureSource,
    track: Arc<TrackLocalStaticSample>,
    enabled: AtomicBool,
    ended: watch::Sender<bool>,
}

impl LocalTrack {
    pub fn new(source: CaptureSource, codec: RTCRtpCodecCapability, stream_id: &str) -> Arc<Self> {
        let track = Arc::new(TrackLocalStaticSample::new(
            codec,
            format!("{}-{}", source.label(), uuid_suffix()),
            stream_id.to_owned(),
        ));
        let (ended, _) = watch::channel(false);

        Arc::new(Self {
            source,
            track,
            enabled: AtomicBool::new(true),
            ended,
        })
    }

    pub fn id(&self) -> &str {
        self.track.id()
    }

    pub fn source(&self) -> CaptureSource {
        self.source
    }

    pub fn kind(&self) -> TrackKind {
        self.source.kind()
    }

    /// The handle RTP senders are bound to.
    pub fn rtp_track(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.track.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Pushes one captured sample. Returns `false` when it was dropped because the track
    /// is disabled or has ended.
    pub async fn write_sample(&self, sample: &Sample) -> Result<bool, webrtc::Error> {
        if !self.is_enabled() || self.is_ended() {
            return Ok(false);
        }
        self.track.write_sample(sample).await?;
        Ok(true)
    }

    /// Marks the capture as finished. Capture backends call this when the source goes
    /// away on its own, e.g. the user ends a screen share from the OS.
    pub fn stop(&self) {
        self.ended.send_replace(true);
    }

    pub fn is_ended(&self) -> bool {
        *self.ended.borrow()
    }

    pub fn ended_signal(&self) -> watch::Receiver<bool> {
        self.ended.subscribe()
    }
}

impl std::fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id())
            .field("source", &self.source)
            .field("enabled", &self.is_enabled())
            .field("ended", &self.is_ended())
            .finish()
    }
}

fn uuid_suffix() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
