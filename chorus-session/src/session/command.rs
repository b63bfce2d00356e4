use tokio::sync::oneshot;

/// Commands the handle feeds into the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// Tear the session down. The sender is acked once teardown finished.
    Leave(oneshot::Sender<()>),
    ToggleMute,
    ToggleDeafen,
    SetNoiseCancellation(u8),
    SwitchInputDevice(String),
    SwitchOutputDevice(String),
}
