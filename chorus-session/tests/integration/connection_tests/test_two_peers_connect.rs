use crate::utils::{InMemoryHub, init_tracing, join_peer, user, wait_for_snapshot, wait_until};

#[tokio::test]
async fn test_two_peers_connect() {
    init_tracing();

    let hub = InMemoryHub::new();
    let a = join_peer(&hub, user(1)).await;
    wait_for_snapshot(&a.handle, "first peer alone", |s| s.participants.len() == 1).await;

    // Both sides offer at once (one from the join delta, one from the
    // initial sync), so this also exercises glare resolution.
    let b = join_peer(&hub, user(2)).await;

    wait_for_snapshot(&a.handle, "a connected to b", |s| {
        s.participants.len() == 2 && s.sessions.len() == 1 && s.sessions[0].connected
    })
    .await;
    wait_for_snapshot(&b.handle, "b connected to a", |s| {
        s.participants.len() == 2 && s.sessions.len() == 1 && s.sessions[0].connected
    })
    .await;

    // Media flows both ways: each side receives the other's track and
    // starts exactly one playback sink.
    wait_until("playback on both sides", || {
        a.playback.active_sinks() == 1 && b.playback.active_sinks() == 1
    })
    .await;
    wait_until("samples arriving at a", || {
        a.playback
            .probe(&user(2))
            .is_some_and(|p| p.samples_written() > 0)
    })
    .await;

    a.handle.leave().await;
    b.handle.leave().await;
}
