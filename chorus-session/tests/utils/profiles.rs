use async_trait::async_trait;
use chorus_core::UserId;
use chorus_session::{Profile, ProfileLookup, SessionError};

/// Lookup that derives a display name from the user id.
pub struct StaticProfiles;

#[async_trait]
impl ProfileLookup for StaticProfiles {
    async fn profile(&self, user_id: &UserId) -> Result<Profile, SessionError> {
        Ok(Profile {
            username: format!("peer-{}", &user_id.to_string()[..4]),
            avatar_url: None,
        })
    }
}
