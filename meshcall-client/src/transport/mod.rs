mod transport_config;
mod transport_event;
mod webrtc_transport;

pub use transport_config::*;
pub use transport_event::*;
pub use webrtc_transport::*;

use crate::media::LocalTrack;
use anyhow::Result;
use async_trait::async_trait;
use meshcall_core::IceCandidate;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One peer-to-peer media session as seen by the negotiation state machine.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn attach_local_tracks(
        &self,
        audio: Option<Arc<LocalTrack>>,
        video: Option<Arc<LocalTrack>>,
    ) -> Result<()>;

    /// Creates an offer and applies it locally.
    async fn create_offer(&self) -> Result<String>;

    /// Applies a remote offer and returns the local answer.
    async fn accept_offer(&self, sdp: String) -> Result<String>;

    async fn apply_answer(&self, sdp: String) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Swaps the outgoing video in place on the established session.
    async fn replace_video_track(&self, track: Arc<LocalTrack>) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Events of the new transport must carry `id`.
    async fn create(
        &self,
        id: TransportId,
        config: TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>>;
}
