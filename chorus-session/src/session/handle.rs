use chorus_core::UserId;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::session::command::SessionCommand;
use crate::session::snapshot::RoomSnapshot;

/// Owning handle to a running voice session.
///
/// Dropping the handle leaves the room; `leave` does the same but waits
/// for teardown to finish. All commands are fire-and-forget and become
/// no-ops once the session has ended.
pub struct VoiceSessionHandle {
    local_user: UserId,
    commands: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<RoomSnapshot>,
}

impl VoiceSessionHandle {
    pub(crate) fn new(
        local_user: UserId,
        commands: mpsc::Sender<SessionCommand>,
        snapshot: watch::Receiver<RoomSnapshot>,
    ) -> Self {
        Self {
            local_user,
            commands,
            snapshot,
        }
    }

    pub fn local_user(&self) -> &UserId {
        &self.local_user
    }

    /// Current session state.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch channel that yields after every state change.
    pub fn watch(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshot.clone()
    }

    /// Leaves the room and waits for teardown. Safe to call twice.
    pub async fn leave(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(SessionCommand::Leave(ack_tx)).await.is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    pub async fn toggle_mute(&self) {
        let _ = self.commands.send(SessionCommand::ToggleMute).await;
    }

    pub async fn toggle_deafen(&self) {
        let _ = self.commands.send(SessionCommand::ToggleDeafen).await;
    }

    pub async fn set_noise_cancellation(&self, level: u8) {
        let _ = self
            .commands
            .send(SessionCommand::SetNoiseCancellation(level))
            .await;
    }

    pub async fn switch_input_device(&self, device: impl Into<String>) {
        let _ = self
            .commands
            .send(SessionCommand::SwitchInputDevice(device.into()))
            .await;
    }

    pub async fn switch_output_device(&self, device: impl Into<String>) {
        let _ = self
            .commands
            .send(SessionCommand::SwitchOutputDevice(device.into()))
            .await;
    }
}

impl Drop for VoiceSessionHandle {
    fn drop(&mut self) {
        // Best effort: the loop also ends when the command channel closes.
        let (ack_tx, _) = oneshot::channel();
        if self.commands.try_send(SessionCommand::Leave(ack_tx)).is_ok() {
            debug!(user = %self.local_user, "leave requested on handle drop");
        }
    }
}
