use async_trait::async_trait;
use chorus_core::{NegotiationMessage, PresenceInfo, UserId};
use tokio::sync::mpsc;

use crate::error::SessionError;

/// Event delivered by a room's signaling channel.
///
/// Presence deltas arrive as `PresenceJoin` / `PresenceLeave`, while
/// `PresenceSync` carries the authoritative full roster and supersedes
/// any deltas received before it.
#[derive(Debug, Clone)]
pub enum SignalEvent {
    PresenceSync(Vec<PresenceInfo>),
    PresenceJoin(Vec<PresenceInfo>),
    PresenceLeave(Vec<UserId>),
    Message(NegotiationMessage),
}

/// Transport-agnostic handle to a room's signaling channel.
///
/// A channel is scoped to a single room. `subscribe` must be called
/// before `track`, and the first event after a successful subscription
/// is a `PresenceSync` describing the current roster.
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Opens the channel and returns the event stream for this room.
    async fn subscribe(&self, local: &UserId) -> Result<mpsc::Receiver<SignalEvent>, SessionError>;

    /// Announces the local user's presence to the room.
    async fn track(&self, presence: PresenceInfo) -> Result<(), SessionError>;

    /// Withdraws the local user's presence.
    async fn untrack(&self);

    /// Broadcasts a negotiation message to the room. Delivery is
    /// best-effort; failures are logged by implementations, not returned.
    async fn send(&self, message: NegotiationMessage);

    /// Tears the channel down. The event stream ends after this call.
    async fn unsubscribe(&self);
}
