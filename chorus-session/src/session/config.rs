use std::time::Duration;

use chorus_audio::DEFAULT_NOISE_CANCELLATION;
use chorus_core::{RoomId, UserId};

use crate::transport::TransportConfig;

pub const DEFAULT_SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything needed to join a room.
#[derive(Debug, Clone)]
pub struct VoiceSessionConfig {
    pub room: RoomId,
    pub local_user: UserId,
    pub transport: TransportConfig,
    /// Initial noise suppression level, 0..=100.
    pub noise_cancellation: u8,
    /// Capture device name; `None` picks the system default.
    pub input_device: Option<String>,
    /// Playback device name; `None` picks the system default.
    pub output_device: Option<String>,
    pub subscribe_timeout: Duration,
    /// How long a peer may stay in negotiation before the session is torn
    /// down and re-offered. Covers lost answers on the best-effort channel.
    pub negotiation_timeout: Duration,
}

impl VoiceSessionConfig {
    pub fn new(room: RoomId, local_user: UserId) -> Self {
        Self {
            room,
            local_user,
            transport: TransportConfig::default(),
            noise_cancellation: DEFAULT_NOISE_CANCELLATION,
            input_device: None,
            output_device: None,
            subscribe_timeout: DEFAULT_SUBSCRIBE_TIMEOUT,
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
        }
    }
}
