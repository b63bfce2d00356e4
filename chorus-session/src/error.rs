use chorus_audio::AudioError;
use chorus_core::UserId;
use thiserror::Error;

/// Errors surfaced by the session layer.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("signaling error: {0}")]
    Signaling(String),

    #[error("negotiation with {peer} failed: {reason}")]
    Negotiation { peer: UserId, reason: String },

    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("transport error: {0}")]
    Transport(#[from] webrtc::Error),

    #[error("invalid negotiation payload: {0}")]
    Payload(#[from] serde_json::Error),
}
