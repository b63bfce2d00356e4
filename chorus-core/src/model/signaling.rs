use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// Negotiation payload relayed over a room's broadcast channel.
///
/// Point-to-point messages carry `from`/`to` interpreted by the receiving
/// client, not by the transport: everyone subscribed to the room sees every
/// message and discards what is not addressed to it. `MuteStatus` is the
/// one genuine broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum NegotiationMessage {
    Offer {
        from: UserId,
        to: UserId,
        sdp: String,
    },
    Answer {
        from: UserId,
        to: UserId,
        sdp: String,
    },
    IceCandidate {
        from: UserId,
        to: UserId,
        /// JSON-encoded candidate init, passed through to the peer stack.
        candidate: String,
    },
    MuteStatus {
        from: UserId,
        muted: bool,
    },
}

impl NegotiationMessage {
    pub fn from_user(&self) -> &UserId {
        match self {
            Self::Offer { from, .. }
            | Self::Answer { from, .. }
            | Self::IceCandidate { from, .. }
            | Self::MuteStatus { from, .. } => from,
        }
    }

    /// Addressee, if the message is point-to-point.
    pub fn to_user(&self) -> Option<&UserId> {
        match self {
            Self::Offer { to, .. } | Self::Answer { to, .. } | Self::IceCandidate { to, .. } => {
                Some(to)
            }
            Self::MuteStatus { .. } => None,
        }
    }

    /// Whether `local` should process this message at all.
    pub fn addressed_to(&self, local: &UserId) -> bool {
        match self.to_user() {
            Some(to) => to == local,
            None => true,
        }
    }
}
