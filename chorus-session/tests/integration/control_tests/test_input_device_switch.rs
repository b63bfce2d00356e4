use std::sync::atomic::Ordering;

use crate::utils::{InMemoryHub, init_tracing, join_peer, user, wait_for_snapshot};

#[tokio::test]
async fn test_input_device_switch() {
    init_tracing();

    let hub = InMemoryHub::new();
    let peer = join_peer(&hub, user(1)).await;

    wait_for_snapshot(&peer.handle, "joined", |s| s.joined).await;
    assert_eq!(peer.handle.snapshot().input_device, "mock-default");

    // A failed switch keeps the current stream and surfaces the error.
    peer.capture.fail_next.store(true, Ordering::SeqCst);
    peer.handle.switch_input_device("usb-mic").await;
    wait_for_snapshot(&peer.handle, "switch failure reported", |s| {
        s.last_error.is_some()
    })
    .await;
    assert_eq!(peer.handle.snapshot().input_device, "mock-default");

    // The retry succeeds and the new device shows up.
    peer.handle.switch_input_device("usb-mic").await;
    wait_for_snapshot(&peer.handle, "switch applied", |s| {
        s.input_device == "usb-mic"
    })
    .await;

    peer.handle.set_noise_cancellation(80).await;
    wait_for_snapshot(&peer.handle, "level applied", |s| s.noise_cancellation == 80).await;
    peer.handle.set_noise_cancellation(200).await;
    wait_for_snapshot(&peer.handle, "level clamped", |s| s.noise_cancellation == 100).await;

    peer.handle.leave().await;
}
