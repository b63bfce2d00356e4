use crate::utils::{InMemoryHub, init_tracing, join_peer, user, wait_for_snapshot};

#[tokio::test]
async fn test_join_empty_room() {
    init_tracing();

    let hub = InMemoryHub::new();
    let peer = join_peer(&hub, user(1)).await;

    wait_for_snapshot(&peer.handle, "solo roster", |s| {
        s.joined && s.participants.len() == 1 && s.sessions.is_empty()
    })
    .await;

    let snapshot = peer.handle.snapshot();
    assert!(!snapshot.muted);
    assert_eq!(snapshot.participants[0].user_id(), &user(1));
    assert_eq!(hub.member_count(), 1);
    assert_eq!(hub.tracked(), vec![user(1)]);

    peer.handle.leave().await;
    assert!(!peer.handle.snapshot().joined);
    assert_eq!(hub.member_count(), 0);
    assert!(hub.tracked().is_empty());
}
