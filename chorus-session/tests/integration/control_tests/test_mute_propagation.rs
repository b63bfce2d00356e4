use crate::utils::{InMemoryHub, init_tracing, join_peer, user, wait_for_snapshot, wait_until};

#[tokio::test]
async fn test_mute_propagation() {
    init_tracing();

    let hub = InMemoryHub::new();
    let a = join_peer(&hub, user(1)).await;
    let b = join_peer(&hub, user(2)).await;

    wait_for_snapshot(&b.handle, "peers connected", |s| {
        s.sessions.len() == 1 && s.sessions[0].connected
    })
    .await;
    wait_until("playback started on b", || b.playback.active_sinks() == 1).await;

    a.handle.toggle_mute().await;

    wait_for_snapshot(&a.handle, "a sees itself muted", |s| s.muted).await;
    wait_for_snapshot(&b.handle, "b sees a muted", |s| {
        s.participants
            .iter()
            .any(|p| *p.user_id() == user(1) && p.info.muted)
    })
    .await;
    // The receive side mutes its sink for a as well.
    wait_until("b's sink for a muted", || {
        b.playback.probe(&user(1)).is_some_and(|p| p.is_muted())
    })
    .await;

    a.handle.toggle_mute().await;

    wait_for_snapshot(&b.handle, "b sees a unmuted", |s| {
        s.participants
            .iter()
            .any(|p| *p.user_id() == user(1) && !p.info.muted)
    })
    .await;
    wait_until("b's sink for a unmuted", || {
        b.playback.probe(&user(1)).is_some_and(|p| !p.is_muted())
    })
    .await;

    a.handle.leave().await;
    b.handle.leave().await;
}
