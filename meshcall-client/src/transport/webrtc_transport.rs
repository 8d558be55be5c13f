use crate::media::{LocalTrack, TrackKind};
use crate::transport::{
    MediaTransport, RemoteTrack, TransportConfig, TransportEvent, TransportFactory, TransportId,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use meshcall_core::IceCandidate;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;

/// `MediaTransport` over a `webrtc` peer connection.
pub struct WebRtcTransport {
    id: TransportId,
    peer_connection: Arc<RTCPeerConnection>,
    video_sender: Mutex<Option<Arc<RTCRtpSender>>>,
    closing: Arc<AtomicBool>,
}

impl WebRtcTransport {
    /// Builds the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        id: TransportId,
        config: TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .into_iter()
                .map(|s| RTCIceServer {
                    urls: s.urls,
                    username: s.username.unwrap_or_default(),
                    credential: s.credential.unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let closing = Arc::new(AtomicBool::new(false));

        let state_tx = event_tx.clone();
        let state_closing = closing.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let closing = state_closing.clone();

                Box::pin(async move {
                    info!("Peer connection state of {}: {}", id, s);
                    let event = match s {
                        RTCPeerConnectionState::Connected => TransportEvent::Connected(id),
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed
                            if !closing.load(Ordering::SeqCst) =>
                        {
                            TransportEvent::Failed(id)
                        }
                        // ICE may still recover from Disconnected.
                        _ => return,
                    };
                    let _ = tx.send(event).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(id, candidate))
                    .await;
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    other => {
                        warn!("Ignoring remote track of kind {} on {}", other, id);
                        return;
                    }
                };
                debug!("Remote {:?} track {} on {}", kind, track.id(), id);
                let remote_track = RemoteTrack {
                    kind,
                    id: track.id(),
                    track,
                };
                let _ = tx
                    .send(TransportEvent::RemoteTrack(id, remote_track))
                    .await;
            })
        }));

        Ok(Self {
            id,
            peer_connection,
            video_sender: Mutex::new(None),
            closing,
        })
    }

    /// RTCP has to be drained for the interceptors (NACK, reports) to work.
    fn drain_rtcp(sender: Arc<RTCRtpSender>) {
        tokio::spawn(async move { while sender.read_rtcp().await.is_ok() {} });
    }
}

#[async_trait]
impl MediaTransport for WebRtcTransport {
    async fn attach_local_tracks(
        &self,
        audio: Option<Arc<LocalTrack>>,
        video: Option<Arc<LocalTrack>>,
    ) -> Result<()> {
        if let Some(audio) = audio {
            let sender = self
                .peer_connection
                .add_track(audio.rtp_track())
                .await
                .context("Failed to attach audio track")?;
            Self::drain_rtcp(sender);
        }

        if let Some(video) = video {
            let sender = self
                .peer_connection
                .add_track(video.rtp_track())
                .await
                .context("Failed to attach video track")?;
            Self::drain_rtcp(sender.clone());
            *self.video_sender.lock().await = Some(sender);
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: String) -> Result<String> {
        let desc = RTCSessionDescription::offer(sdp)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to apply remote offer")?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn apply_answer(&self, sdp: String) -> Result<()> {
        let desc = RTCSessionDescription::answer(sdp)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to apply remote answer")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn replace_video_track(&self, track: Arc<LocalTrack>) -> Result<()> {
        let sender = self
            .video_sender
            .lock()
            .await
            .clone()
            .with_context(|| format!("No video sender on transport {}", self.id))?;
        sender.replace_track(Some(track.rtp_track())).await?;
        debug!("Outgoing video on {} is now {}", self.id, track.id());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // Our own teardown is not a failure to report.
        self.closing.store(true, Ordering::SeqCst);
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates a [`WebRtcTransport`] per remote peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcTransportFactory;

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        id: TransportId,
        config: TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>> {
        let transport = WebRtcTransport::new(id, config, events).await?;
        Ok(Box::new(transport))
    }
}
