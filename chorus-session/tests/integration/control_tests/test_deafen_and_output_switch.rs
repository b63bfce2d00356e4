use crate::utils::{InMemoryHub, init_tracing, join_peer, user, wait_for_snapshot, wait_until};

#[tokio::test]
async fn test_deafen_and_output_switch() {
    init_tracing();

    let hub = InMemoryHub::new();
    let a = join_peer(&hub, user(1)).await;
    let b = join_peer(&hub, user(2)).await;

    wait_for_snapshot(&a.handle, "peers connected", |s| {
        s.sessions.len() == 1 && s.sessions[0].connected
    })
    .await;
    wait_until("playback started on a", || a.playback.active_sinks() == 1).await;

    a.handle.toggle_deafen().await;
    wait_for_snapshot(&a.handle, "a deafened", |s| s.deafened).await;
    wait_until("a's sink muted by deafen", || {
        a.playback.probe(&user(2)).is_some_and(|p| p.is_muted())
    })
    .await;

    a.handle.switch_output_device("headset").await;
    wait_until("output device applied", || {
        a.playback
            .probe(&user(2))
            .is_some_and(|p| p.device().as_deref() == Some("headset"))
    })
    .await;

    // Undeafening unmutes the sink again; b itself was never muted.
    a.handle.toggle_deafen().await;
    wait_for_snapshot(&a.handle, "a undeafened", |s| !s.deafened).await;
    wait_until("a's sink unmuted", || {
        a.playback.probe(&user(2)).is_some_and(|p| !p.is_muted())
    })
    .await;

    a.handle.leave().await;
    b.handle.leave().await;
}
