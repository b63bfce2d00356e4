pub mod test_join_empty_room;
pub mod test_stalled_negotiation_recovers;
pub mod test_sync_is_idempotent;
pub mod test_two_peers_connect;
