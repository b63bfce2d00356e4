pub mod peer_pool;
pub mod peer_session;

pub use peer_pool::{PeerPool, SessionInfo};
pub use peer_session::{NegotiationState, PeerSession};

use chorus_core::UserId;

/// Glare rule: when both sides have an offer in flight, the offer from
/// the lexicographically lower user id wins and the other side answers.
pub fn incoming_offer_wins(remote: &UserId, local: &UserId) -> bool {
    remote < local
}
