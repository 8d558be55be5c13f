use crate::error::CallError;
use async_trait::async_trait;
use meshcall_core::RoomKey;

/// Who the local user is, as shown to the other participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub user_id: String,
    pub display_name: String,
}

/// Identity resolution and admission checks owned by the surrounding application.
/// Both are consulted before a `join` is sent.
#[async_trait]
pub trait Membership: Send + Sync {
    async fn current_identity(&self) -> Result<LocalIdentity, CallError>;

    async fn can_join(&self, identity: &LocalIdentity, room: &RoomKey) -> Result<bool, CallError>;
}

/// Fixed identity, every room allowed.
pub struct StaticMembership {
    identity: LocalIdentity,
}

impl StaticMembership {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            identity: LocalIdentity {
                user_id: user_id.into(),
                display_name: display_name.into(),
            },
        }
    }
}

#[async_trait]
impl Membership for StaticMembership {
    async fn current_identity(&self) -> Result<LocalIdentity, CallError> {
        Ok(self.identity.clone())
    }

    async fn can_join(&self, _identity: &LocalIdentity, _room: &RoomKey) -> Result<bool, CallError> {
        Ok(true)
    }
}
