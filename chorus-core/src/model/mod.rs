mod participant;
mod room;
mod signaling;
mod user;

pub use participant::{Participant, PresenceInfo};
pub use room::RoomId;
pub use signaling::{IceServerConfig, NegotiationMessage};
pub use user::UserId;
