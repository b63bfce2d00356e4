use std::time::Duration;

use crate::utils::{InMemoryHub, init_tracing, join_peer, user, wait_for_snapshot};

#[tokio::test]
async fn test_sync_is_idempotent() {
    init_tracing();

    let hub = InMemoryHub::new();
    let a = join_peer(&hub, user(1)).await;
    let b = join_peer(&hub, user(2)).await;

    wait_for_snapshot(&a.handle, "peers connected", |s| {
        s.sessions.len() == 1 && s.sessions[0].connected
    })
    .await;

    // Re-syncs with an unchanged roster must not churn the pool.
    hub.broadcast_sync().await;
    hub.broadcast_sync().await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    for handle in [&a.handle, &b.handle] {
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.participants.len(), 2);
        assert_eq!(snapshot.sessions.len(), 1);
        assert!(snapshot.sessions[0].connected, "session survived re-sync");
    }

    a.handle.leave().await;
    b.handle.leave().await;
}
