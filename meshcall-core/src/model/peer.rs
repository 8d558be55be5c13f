use crate::model::connection::ConnectionId;
use serde::{Deserialize, Serialize};

/// Public identity of a call participant as seen by the other members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerInfo {
    pub connection_id: ConnectionId,
    pub user_id: String,
    pub display_name: String,
}
