use async_trait::async_trait;
use chorus_core::UserId;

use crate::error::SessionError;

/// Display profile attached to a participant's presence.
#[derive(Debug, Clone)]
pub struct Profile {
    pub username: String,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Fallback profile used when the lookup fails; the session still
    /// joins, it just shows up without a display name.
    pub fn placeholder(user_id: &UserId) -> Self {
        Profile {
            username: format!("user-{}", &user_id.to_string()[..8]),
            avatar_url: None,
        }
    }
}

/// Resolves a user id to its display profile.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn profile(&self, user_id: &UserId) -> Result<Profile, SessionError>;
}
