pub use chorus_core::{RoomId, UserId};

pub mod model {
    pub use chorus_core::*;
}

#[cfg(feature = "audio")]
pub mod audio {
    pub use chorus_audio::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use chorus_session::*;
}

#[cfg(feature = "session")]
pub use chorus_session::{VoiceSession, VoiceSessionConfig, VoiceSessionHandle};
