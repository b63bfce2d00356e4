pub mod command;
pub mod config;
pub mod factory;
pub mod handle;
pub mod manager;
pub mod snapshot;

pub use command::SessionCommand;
pub use config::VoiceSessionConfig;
pub use factory::{CpalPlaybackFactory, PlaybackFactory};
pub use handle::VoiceSessionHandle;
pub use manager::VoiceSession;
pub use snapshot::RoomSnapshot;
