pub mod mock_audio;
pub mod mock_hub;
pub mod profiles;

pub use helpers::*;
pub use mock_audio::*;
pub use mock_hub::*;
pub use profiles::*;
