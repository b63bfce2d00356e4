use crate::utils::{InMemoryHub, init_tracing, join_peer, user, wait_for_snapshot};

#[tokio::test]
async fn test_three_peers_mesh() {
    init_tracing();

    let hub = InMemoryHub::new();
    let a = join_peer(&hub, user(1)).await;
    let b = join_peer(&hub, user(2)).await;
    let c = join_peer(&hub, user(3)).await;

    for (name, peer) in [("a", &a), ("b", &b), ("c", &c)] {
        wait_for_snapshot(&peer.handle, name, |s| {
            s.participants.len() == 3
                && s.sessions.len() == 2
                && s.sessions.iter().all(|info| info.connected)
        })
        .await;
    }

    a.handle.leave().await;

    for (name, peer) in [("b after a left", &b), ("c after a left", &c)] {
        wait_for_snapshot(&peer.handle, name, |s| {
            s.participants.len() == 2 && s.sessions.len() == 1 && s.sessions[0].connected
        })
        .await;
    }

    b.handle.leave().await;
    c.handle.leave().await;
    assert_eq!(hub.member_count(), 0);
}
