use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::utils::{InMemoryHub, init_tracing, join_peer_via, user, wait_for_snapshot};

// The broadcast channel is best-effort. When the answer to our offer is
// lost, the transport never gets a remote description, ICE never starts,
// and no state change ever arrives. The session must not sit in
// negotiation forever: past the timeout it is failed, surfaced in
// `last_error`, and re-offered while the peer is still present.
#[tokio::test]
async fn test_stalled_negotiation_recovers() {
    init_tracing();
    let hub = InMemoryHub::new();
    let retry = Some(Duration::from_secs(2));

    let a = join_peer_via(hub.channel(user(1)), user(1), retry).await;

    // b answers a's offers (lower id wins), but its answers get dropped.
    let (channel, drop_answers) = hub.lossy_channel(user(2));
    drop_answers.store(true, Ordering::Release);
    let b = join_peer_via(channel, user(2), retry).await;

    wait_for_snapshot(&a.handle, "stalled negotiation surfaced", |s| {
        s.last_error
            .as_deref()
            .is_some_and(|e| e.contains("negotiation timed out"))
    })
    .await;

    // Once answers go through again, the retry cycle completes the
    // handshake without either side re-joining.
    drop_answers.store(false, Ordering::Release);
    wait_for_snapshot(&a.handle, "a connected to b", |s| {
        s.sessions
            .iter()
            .any(|info| info.remote == user(2) && info.connected)
    })
    .await;
    wait_for_snapshot(&b.handle, "b connected to a", |s| {
        s.sessions
            .iter()
            .any(|info| info.remote == user(1) && info.connected)
    })
    .await;

    a.handle.leave().await;
    b.handle.leave().await;
}
