use crate::error::{CallError, NegotiationError};
use crate::media::{CallMode, CaptureDevices, LocalMediaController, LocalMediaState, LocalTracks, SampleDevices};
use crate::membership::Membership;
use crate::session::{PeerSessionTable, PeerSnapshot};
use crate::signal::{SignalSink, connect_signaling};
use crate::transport::{RemoteTrack, TransportEvent, TransportFactory, WebRtcTransportFactory};
use meshcall_core::{ConnectionId, IceServerConfig, RoomKey, ServerMessage};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};

mod call_handle;
mod handle_command_impl;
mod handle_signal_impl;
mod handle_transport_impl;
mod session_lifecycle_impl;

pub use call_handle::*;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// WebSocket endpoint of the signaling server, e.g. `ws://host:8080/ws`.
    pub url: String,
    /// Used until the server sends its own `ice_config`.
    pub ice_servers: Option<Vec<IceServerConfig>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEndReason {
    Left,
    /// Another connection of the same user took our place in the room.
    Evicted,
    SignalLost,
}

/// Notifications for the application driving the call UI.
#[derive(Debug)]
pub enum CallEvent {
    Connected { connection_id: ConnectionId },
    PeerJoined(PeerSnapshot),
    PeerConnected(ConnectionId),
    PeerFailed {
        connection_id: ConnectionId,
        error: NegotiationError,
    },
    PeerLeft(ConnectionId),
    RemoteTrack {
        connection_id: ConnectionId,
        track: RemoteTrack,
    },
    ScreenShareStopped,
    CallEnded {
        room: RoomKey,
        reason: CallEndReason,
    },
}

pub enum CallCommand {
    Join {
        room: RoomKey,
        mode: CallMode,
        reply: oneshot::Sender<Result<(), CallError>>,
    },
    Leave {
        reply: oneshot::Sender<Result<(), CallError>>,
    },
    /// `None` flips the current value.
    SetMuted {
        muted: Option<bool>,
        reply: oneshot::Sender<Result<bool, CallError>>,
    },
    SetCameraOff {
        off: Option<bool>,
        reply: oneshot::Sender<Result<bool, CallError>>,
    },
    StartScreenShare {
        reply: oneshot::Sender<Result<(), CallError>>,
    },
    StopScreenShare {
        reply: oneshot::Sender<Result<(), CallError>>,
    },
    Peers {
        reply: oneshot::Sender<Vec<PeerSnapshot>>,
    },
    MediaState {
        reply: oneshot::Sender<LocalMediaState>,
    },
    LocalTracks {
        reply: oneshot::Sender<LocalTracks>,
    },
    ConnectionId {
        reply: oneshot::Sender<Option<ConnectionId>>,
    },
}

/// Collaborators a manager is built from.
pub struct ManagerParts {
    pub signal: Arc<dyn SignalSink>,
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
    pub transports: Arc<dyn TransportFactory>,
    pub devices: Arc<dyn CaptureDevices>,
    pub membership: Arc<dyn Membership>,
    pub ice_servers: Vec<IceServerConfig>,
}

/// Event loop owning every peer session of the local participant and its local media.
///
/// Server messages, application commands, transport events and the end of a screen
/// capture are all consumed here one at a time, so no two transitions ever race.
pub struct PeerSessionManager {
    local_id: Option<ConnectionId>,
    room: Option<RoomKey>,
    ice_servers: Vec<IceServerConfig>,
    sessions: PeerSessionTable,
    /// Last generation handed to a transport.
    transport_generation: u64,
    media: LocalMediaController,
    transports: Arc<dyn TransportFactory>,
    membership: Arc<dyn Membership>,
    signal: Arc<dyn SignalSink>,
    inbound_rx: mpsc::UnboundedReceiver<ServerMessage>,
    command_rx: mpsc::Receiver<CallCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    transport_tx: mpsc::Sender<TransportEvent>,
    events_tx: mpsc::UnboundedSender<CallEvent>,
}

impl PeerSessionManager {
    pub fn new(parts: ManagerParts) -> (Self, CallHandle, mpsc::UnboundedReceiver<CallEvent>) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let manager = Self {
            local_id: None,
            room: None,
            ice_servers: parts.ice_servers,
            sessions: PeerSessionTable::new(),
            transport_generation: 0,
            media: LocalMediaController::new(parts.devices),
            transports: parts.transports,
            membership: parts.membership,
            signal: parts.signal,
            inbound_rx: parts.inbound,
            command_rx,
            transport_rx,
            transport_tx,
            events_tx,
        };

        (manager, CallHandle::new(command_tx), events_rx)
    }

    /// Builds the manager and runs it on a new task.
    pub fn spawn(parts: ManagerParts) -> (CallHandle, mpsc::UnboundedReceiver<CallEvent>) {
        let (manager, handle, events) = Self::new(parts);
        tokio::spawn(manager.run());
        (handle, events)
    }

    pub async fn run(mut self) {
        info!("Call engine started");

        loop {
            let screen_ended = self.media.screen_ended_signal();

            tokio::select! {
                msg = self.inbound_rx.recv() => {
                    match msg {
                        Some(m) => self.handle_server_message(m).await,
                        None => {
                            warn!("Signal channel closed. Ending call.");
                            self.end_call(CallEndReason::SignalLost, false).await;
                            break;
                        }
                    }
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All call handles dropped. Shutting down engine.");
                            self.end_call(CallEndReason::Left, true).await;
                            break;
                        }
                    }
                }

                Some(evt) = self.transport_rx.recv() => {
                    self.handle_transport_event(evt).await;
                }

                _ = capture_ended(screen_ended) => {
                    self.on_screen_capture_ended().await;
                }
            }
        }

        info!("Call engine finished");
    }

    fn emit(&self, event: CallEvent) {
        let _ = self.events_tx.send(event);
    }
}

async fn capture_ended(signal: Option<watch::Receiver<bool>>) {
    match signal {
        Some(mut ended) => {
            if ended.wait_for(|ended| *ended).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending().await,
    }
}

/// Connects to the signaling server and starts an engine backed by `webrtc` transports
/// and sample-fed capture tracks.
pub async fn connect(
    config: EngineConfig,
    membership: Arc<dyn Membership>,
) -> anyhow::Result<(CallHandle, mpsc::UnboundedReceiver<CallEvent>)> {
    let channel = connect_signaling(&config.url).await?;

    Ok(PeerSessionManager::spawn(ManagerParts {
        signal: Arc::new(channel.outbound),
        inbound: channel.inbound,
        transports: Arc::new(WebRtcTransportFactory),
        devices: Arc::new(SampleDevices::default()),
        membership,
        ice_servers: config
            .ice_servers
            .unwrap_or_else(IceServerConfig::default_stun),
    }))
}
