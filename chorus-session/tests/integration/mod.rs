pub mod connection_tests;
pub mod control_tests;
pub mod multi_peer_tests;
