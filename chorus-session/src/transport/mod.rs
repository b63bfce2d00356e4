pub mod mic_track;
pub mod peer_transport;
pub mod transport_config;
pub mod transport_event;

pub use mic_track::{MicTrack, decode_samples, encode_samples};
pub use peer_transport::PeerTransport;
pub use transport_config::TransportConfig;
pub use transport_event::TransportEvent;
