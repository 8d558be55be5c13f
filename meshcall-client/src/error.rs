use meshcall_core::{ConnectionId, RoomKey};
use thiserror::Error;

/// Local capture could not be acquired. Reported to the caller at acquisition time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission to capture {0} was denied")]
    PermissionDenied(&'static str),

    #[error("{0} capture device is unavailable")]
    DeviceUnavailable(&'static str),
}

/// A single peer session could not be negotiated or lost connectivity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("{step} with {remote} failed: {reason}")]
    Transport {
        remote: ConnectionId,
        step: &'static str,
        reason: String,
    },

    #[error("connectivity to {0} was lost")]
    ConnectivityLost(ConnectionId),
}

impl NegotiationError {
    pub(crate) fn transport(remote: ConnectionId, step: &'static str, err: anyhow::Error) -> Self {
        Self::Transport {
            remote,
            step,
            reason: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CallError {
    #[error("not in a call")]
    NotInCall,

    #[error("already in call {0}")]
    AlreadyInCall(RoomKey),

    #[error("not allowed to join {0}")]
    AdmissionDenied(RoomKey),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("the call carries no video sender to replace")]
    NoVideoSender,

    #[error("signal channel closed")]
    SignalClosed,

    #[error("call engine has stopped")]
    EngineStopped,
}
