use chorus_core::Participant;

use crate::pool::SessionInfo;

/// Observable state of a voice session, published through a watch channel
/// after every change.
#[derive(Debug, Clone, Default)]
pub struct RoomSnapshot {
    /// Current roster, local user included, in id order.
    pub participants: Vec<Participant>,
    /// One entry per pooled peer connection.
    pub sessions: Vec<SessionInfo>,
    /// False once the session has left the room.
    pub joined: bool,
    /// Local mute state.
    pub muted: bool,
    /// Local deafen state (all playback muted).
    pub deafened: bool,
    pub noise_cancellation: u8,
    /// Name of the capture device currently in use.
    pub input_device: String,
    /// Last non-fatal error, kept until the next one replaces it.
    pub last_error: Option<String>,
}
