use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::utils::{InMemoryHub, init_tracing, join_peer_via, user, wait_for_snapshot};

// One peer whose negotiation keeps failing must not take the room down:
// the healthy pair connects regardless, the failure lands in
// `last_error`, and the broken leg heals once its signaling recovers.
#[tokio::test]
async fn test_failed_peer_is_isolated() {
    init_tracing();
    let hub = InMemoryHub::new();
    let retry = Some(Duration::from_secs(2));

    let a = join_peer_via(hub.channel(user(1)), user(1), retry).await;
    let b = join_peer_via(hub.channel(user(2)), user(2), retry).await;

    // c answers both a and b, but every answer is lost in transit.
    let (channel, drop_answers) = hub.lossy_channel(user(3));
    drop_answers.store(true, Ordering::Release);
    let c = join_peer_via(channel, user(3), retry).await;

    // a and b connect to each other while their legs toward c stall.
    for (name, peer, other) in [("a", &a, user(2)), ("b", &b, user(1))] {
        wait_for_snapshot(&peer.handle, name, |s| {
            s.participants.len() == 3
                && s.sessions
                    .iter()
                    .any(|info| info.remote == other && info.connected)
                && s.last_error
                    .as_deref()
                    .is_some_and(|e| e.contains("negotiation timed out"))
        })
        .await;
    }

    // The established pair never went down while c was failing.
    assert!(
        a.handle
            .snapshot()
            .sessions
            .iter()
            .any(|info| info.remote == user(2) && info.connected)
    );

    drop_answers.store(false, Ordering::Release);
    for (name, peer) in [("a meshed", &a), ("b meshed", &b), ("c meshed", &c)] {
        wait_for_snapshot(&peer.handle, name, |s| {
            s.sessions.len() == 2 && s.sessions.iter().all(|info| info.connected)
        })
        .await;
    }

    a.handle.leave().await;
    b.handle.leave().await;
    c.handle.leave().await;
}
