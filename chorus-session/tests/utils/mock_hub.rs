use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chorus_core::{NegotiationMessage, PresenceInfo, UserId};
use chorus_session::{SessionError, SignalEvent, SignalingChannel};
use dashmap::DashMap;
use tokio::sync::mpsc;

struct HubState {
    members: DashMap<UserId, mpsc::Sender<SignalEvent>>,
    presences: DashMap<UserId, PresenceInfo>,
}

impl HubState {
    /// Snapshot of subscriber senders, so no map guard is held across awaits.
    fn senders(&self) -> Vec<(UserId, mpsc::Sender<SignalEvent>)> {
        self.members
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn roster(&self) -> Vec<PresenceInfo> {
        self.presences
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

/// In-memory stand-in for a room's broadcast channel: every subscriber
/// sees every message except its own, presence changes fan out as deltas,
/// and a fresh subscriber gets the authoritative sync first.
#[derive(Clone)]
pub struct InMemoryHub {
    state: Arc<HubState>,
}

impl InMemoryHub {
    pub fn new() -> Self {
        Self {
            state: Arc::new(HubState {
                members: DashMap::new(),
                presences: DashMap::new(),
            }),
        }
    }

    pub fn channel(&self, local: UserId) -> Arc<HubChannel> {
        Arc::new(HubChannel {
            state: self.state.clone(),
            local,
        })
    }

    /// A channel whose outgoing answers vanish while the returned flag is
    /// set, the way a best-effort broadcast loses messages.
    pub fn lossy_channel(&self, local: UserId) -> (Arc<LossyChannel>, Arc<AtomicBool>) {
        let drop_answers = Arc::new(AtomicBool::new(false));
        let channel = Arc::new(LossyChannel {
            inner: HubChannel {
                state: self.state.clone(),
                local,
            },
            drop_answers: drop_answers.clone(),
        });
        (channel, drop_answers)
    }

    pub fn member_count(&self) -> usize {
        self.state.members.len()
    }

    pub fn tracked(&self) -> Vec<UserId> {
        self.state
            .presences
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Pushes a full presence sync to every subscriber, the way a real
    /// backend re-syncs after a reconnect.
    pub async fn broadcast_sync(&self) {
        let roster = self.state.roster();
        for (_, sender) in self.state.senders() {
            let _ = sender.send(SignalEvent::PresenceSync(roster.clone())).await;
        }
    }
}

/// One user's view of the hub.
pub struct HubChannel {
    state: Arc<HubState>,
    local: UserId,
}

#[async_trait]
impl SignalingChannel for HubChannel {
    async fn subscribe(&self, local: &UserId) -> Result<mpsc::Receiver<SignalEvent>, SessionError> {
        assert_eq!(local, &self.local, "channel is scoped to one user");

        let (tx, rx) = mpsc::channel(256);
        let _ = tx.send(SignalEvent::PresenceSync(self.state.roster())).await;
        self.state.members.insert(self.local.clone(), tx);
        Ok(rx)
    }

    async fn track(&self, presence: PresenceInfo) -> Result<(), SessionError> {
        let id = presence.user_id.clone();
        self.state.presences.insert(id.clone(), presence.clone());
        for (member, sender) in self.state.senders() {
            if member != id {
                let _ = sender
                    .send(SignalEvent::PresenceJoin(vec![presence.clone()]))
                    .await;
            }
        }
        Ok(())
    }

    async fn untrack(&self) {
        if self.state.presences.remove(&self.local).is_none() {
            return;
        }
        for (member, sender) in self.state.senders() {
            if member != self.local {
                let _ = sender
                    .send(SignalEvent::PresenceLeave(vec![self.local.clone()]))
                    .await;
            }
        }
    }

    async fn send(&self, message: NegotiationMessage) {
        let from = message.from_user().clone();
        for (member, sender) in self.state.senders() {
            if member != from {
                let _ = sender.send(SignalEvent::Message(message.clone())).await;
            }
        }
    }

    async fn unsubscribe(&self) {
        self.state.members.remove(&self.local);
    }
}

/// Hub channel that silently discards outgoing answers on demand.
pub struct LossyChannel {
    inner: HubChannel,
    drop_answers: Arc<AtomicBool>,
}

#[async_trait]
impl SignalingChannel for LossyChannel {
    async fn subscribe(&self, local: &UserId) -> Result<mpsc::Receiver<SignalEvent>, SessionError> {
        self.inner.subscribe(local).await
    }

    async fn track(&self, presence: PresenceInfo) -> Result<(), SessionError> {
        self.inner.track(presence).await
    }

    async fn untrack(&self) {
        self.inner.untrack().await;
    }

    async fn send(&self, message: NegotiationMessage) {
        if self.drop_answers.load(Ordering::Acquire)
            && matches!(message, NegotiationMessage::Answer { .. })
        {
            return;
        }
        self.inner.send(message).await;
    }

    async fn unsubscribe(&self) {
        self.inner.unsubscribe().await;
    }
}
