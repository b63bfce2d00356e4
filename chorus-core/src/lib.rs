pub mod model;

pub use model::{
    IceServerConfig, NegotiationMessage, Participant, PresenceInfo, RoomId, UserId,
};
