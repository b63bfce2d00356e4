use std::sync::Arc;

use chorus_core::UserId;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::track::track_remote::TrackRemote;

/// Events emitted by peer transports into the session loop.
#[derive(Clone)]
pub enum TransportEvent {
    /// A local ICE candidate is ready to be relayed to the remote peer.
    /// The payload is the JSON-encoded candidate init.
    CandidateGenerated(UserId, String),
    /// The underlying peer connection changed state.
    StateChanged(UserId, RTCPeerConnectionState),
    /// The remote peer's audio track arrived.
    RemoteTrack(UserId, Arc<TrackRemote>),
    /// Speech activity on a remote track flipped.
    SpeakingChanged(UserId, bool),
}

impl std::fmt::Debug for TransportEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CandidateGenerated(id, _) => write!(f, "CandidateGenerated({id})"),
            Self::StateChanged(id, s) => write!(f, "StateChanged({id}, {s})"),
            Self::RemoteTrack(id, _) => write!(f, "RemoteTrack({id})"),
            Self::SpeakingChanged(id, s) => write!(f, "SpeakingChanged({id}, {s})"),
        }
    }
}
