//! Voice session management: presence-driven peer discovery, WebRTC
//! negotiation over a signaling channel, and a per-room actor that keeps
//! the peer connection pool converged with the room roster.

pub mod error;
pub mod pool;
pub mod session;
pub mod signaling;
pub mod transport;

pub use error::SessionError;
pub use pool::{NegotiationState, PeerPool, PeerSession, SessionInfo};
pub use session::{
    CpalPlaybackFactory, PlaybackFactory, RoomSnapshot, VoiceSession, VoiceSessionConfig,
    VoiceSessionHandle,
};
pub use signaling::{Profile, ProfileLookup, RosterState, SignalEvent, SignalingChannel};
pub use transport::{MicTrack, PeerTransport, TransportConfig, TransportEvent};
