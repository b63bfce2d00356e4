use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// What a client publishes about itself when tracking presence in a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceInfo {
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub muted: bool,
}

impl PresenceInfo {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            avatar_url: None,
            muted: false,
        }
    }
}

/// Roster entry: published presence plus the locally derived speaking flag.
///
/// `speaking` is never carried over the wire; each client computes it from
/// the audio it actually receives (or captures, for itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub info: PresenceInfo,
    pub speaking: bool,
}

impl Participant {
    pub fn new(info: PresenceInfo) -> Self {
        Self {
            info,
            speaking: false,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.info.user_id
    }
}
