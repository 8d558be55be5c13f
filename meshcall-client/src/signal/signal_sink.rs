use crate::error::CallError;
use meshcall_core::ClientMessage;
use tokio::sync::mpsc;

/// Outbound half of the signal transport as seen by the session manager.
pub trait SignalSink: Send + Sync {
    fn send(&self, msg: ClientMessage) -> Result<(), CallError>;
}

impl SignalSink for mpsc::UnboundedSender<ClientMessage> {
    fn send(&self, msg: ClientMessage) -> Result<(), CallError> {
        mpsc::UnboundedSender::send(self, msg).map_err(|_| CallError::SignalClosed)
    }
}
