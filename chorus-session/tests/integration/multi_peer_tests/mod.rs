pub mod test_failed_peer_is_isolated;
pub mod test_three_peers_mesh;
