use std::collections::HashMap;
use std::time::Duration;

use chorus_core::UserId;
use tracing::{debug, warn};

use crate::pool::peer_session::PeerSession;

/// Connection status of one pooled peer, as exposed in snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub remote: UserId,
    pub connected: bool,
}

/// All live peer sessions of a voice session, keyed by remote user id.
///
/// At most one session per peer: inserting over an existing entry closes
/// the old connection first. Removal always closes.
#[derive(Default)]
pub struct PeerPool {
    sessions: HashMap<UserId, PeerSession>,
}

impl PeerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn get(&self, id: &UserId) -> Option<&PeerSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &UserId) -> Option<&mut PeerSession> {
        self.sessions.get_mut(id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &PeerSession> {
        self.sessions.values()
    }

    pub fn ids(&self) -> Vec<UserId> {
        self.sessions.keys().cloned().collect()
    }

    /// Peers whose negotiation has been pending longer than `timeout`.
    pub fn stalled(&self, timeout: Duration) -> Vec<UserId> {
        self.sessions
            .values()
            .filter(|s| s.stalled(timeout))
            .map(|s| s.remote.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub async fn insert(&mut self, session: PeerSession) {
        let remote = session.remote.clone();
        if let Some(old) = self.sessions.insert(remote.clone(), session) {
            debug!(%remote, "replacing existing peer session");
            close_session(old).await;
        }
    }

    /// Removes and closes the peer's session. Returns whether one existed.
    pub async fn remove(&mut self, id: &UserId) -> bool {
        match self.sessions.remove(id) {
            Some(session) => {
                close_session(session).await;
                true
            }
            None => false,
        }
    }

    /// Closes every session. Returns how many were closed.
    pub async fn clear(&mut self) -> usize {
        let sessions: Vec<_> = self.sessions.drain().map(|(_, s)| s).collect();
        let count = sessions.len();
        for session in sessions {
            close_session(session).await;
        }
        count
    }

    pub fn summaries(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<_> = self
            .sessions
            .values()
            .map(|s| SessionInfo {
                remote: s.remote.clone(),
                connected: s.is_connected(),
            })
            .collect();
        infos.sort_by(|a, b| a.remote.cmp(&b.remote));
        infos
    }
}

async fn close_session(session: PeerSession) {
    if let Err(err) = session.transport.close().await {
        warn!(remote = %session.remote, %err, "error closing peer connection");
    }
    // Dropping the session drops its playback sink; the track reader task
    // only holds a weak handle and stops on its own.
}
