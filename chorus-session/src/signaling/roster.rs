use std::collections::BTreeMap;

use chorus_core::{Participant, PresenceInfo, UserId};

/// Local view of a room's roster, keyed by user id.
///
/// Presence syncs are authoritative: a sync replaces the whole roster,
/// but the locally derived `speaking` flags of retained participants
/// survive it. Join and leave deltas apply on top of the last sync.
#[derive(Debug)]
pub struct RosterState {
    local: UserId,
    participants: BTreeMap<UserId, Participant>,
}

impl RosterState {
    pub fn new(local: UserId) -> Self {
        Self {
            local,
            participants: BTreeMap::new(),
        }
    }

    pub fn local(&self) -> &UserId {
        &self.local
    }

    /// The local entry only leaves through an explicit `clear`: syncs can
    /// race the local track call and arrive without it.
    pub fn apply_sync(&mut self, infos: Vec<PresenceInfo>) {
        let previous = std::mem::take(&mut self.participants);
        for info in infos {
            let mut participant = Participant::new(info);
            if let Some(old) = previous.get(participant.user_id()) {
                participant.speaking = old.speaking;
            }
            self.participants
                .insert(participant.user_id().clone(), participant);
        }
        if !self.participants.contains_key(&self.local) {
            if let Some(local) = previous.get(&self.local) {
                self.participants.insert(self.local.clone(), local.clone());
            }
        }
    }

    pub fn apply_join(&mut self, infos: Vec<PresenceInfo>) {
        for info in infos {
            self.participants
                .entry(info.user_id.clone())
                .or_insert_with(|| Participant::new(info));
        }
    }

    pub fn apply_leave(&mut self, ids: &[UserId]) {
        for id in ids {
            self.participants.remove(id);
        }
    }

    /// Returns true when the flag actually changed.
    pub fn set_muted(&mut self, id: &UserId, muted: bool) -> bool {
        match self.participants.get_mut(id) {
            Some(p) if p.info.muted != muted => {
                p.info.muted = muted;
                true
            }
            _ => false,
        }
    }

    /// Returns true when the flag actually changed.
    pub fn set_speaking(&mut self, id: &UserId, speaking: bool) -> bool {
        match self.participants.get_mut(id) {
            Some(p) if p.speaking != speaking => {
                p.speaking = speaking;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn is_muted(&self, id: &UserId) -> bool {
        self.participants
            .get(id)
            .map(|p| p.info.muted)
            .unwrap_or(false)
    }

    /// Every participant except the local user, in id order.
    pub fn remote_ids(&self) -> Vec<UserId> {
        self.participants
            .keys()
            .filter(|id| **id != self.local)
            .cloned()
            .collect()
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.participants.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }
}
