pub mod channel;
pub mod profile;
pub mod roster;

pub use channel::{SignalEvent, SignalingChannel};
pub use profile::{Profile, ProfileLookup};
pub use roster::RosterState;
