use std::sync::Arc;
use std::time::{Duration, Instant};

use chorus_audio::PlaybackSink;
use chorus_core::UserId;

use crate::transport::PeerTransport;

/// Where negotiation with a peer currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// We sent an offer and are waiting for the answer.
    OfferSent,
    /// We answered the peer's offer and are waiting for ICE to complete.
    OfferReceived,
    /// The underlying connection reached `Connected`.
    Connected,
}

/// A remote participant's connection and its receive-side resources.
pub struct PeerSession {
    pub remote: UserId,
    pub transport: PeerTransport,
    pub negotiation: NegotiationState,
    /// Set once the remote track arrives and playback starts.
    pub playback: Option<Arc<dyn PlaybackSink>>,
    opened: Instant,
}

impl PeerSession {
    pub fn new(transport: PeerTransport, negotiation: NegotiationState) -> Self {
        Self {
            remote: transport.remote.clone(),
            transport,
            negotiation,
            playback: None,
            opened: Instant::now(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.negotiation == NegotiationState::Connected
    }

    /// True once negotiation has been pending longer than `timeout`.
    /// Signaling is best-effort, so a lost answer leaves the session here
    /// until the owner tears it down and re-offers.
    pub fn stalled(&self, timeout: Duration) -> bool {
        !self.is_connected() && self.opened.elapsed() >= timeout
    }
}
