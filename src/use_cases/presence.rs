// In-process occupant tracking for an area, fed by connection join/leave.

use crate::domain::{PlayerId, PresenceRegistry};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, Default)]
pub struct OccupantSet {
    inner: Arc<RwLock<BTreeSet<PlayerId>>>,
}

impl OccupantSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the player is already inside the area.
    pub fn insert(&self, player_id: PlayerId) -> bool {
        self.write().insert(player_id)
    }

    pub fn remove(&self, player_id: &str) -> bool {
        self.write().remove(player_id)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.read().contains(player_id)
    }

    // A panic while holding the lock cannot leave the set half-updated, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, BTreeSet<PlayerId>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeSet<PlayerId>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl PresenceRegistry for OccupantSet {
    fn occupants(&self) -> Vec<PlayerId> {
        self.read().iter().cloned().collect()
    }

    fn occupant_count(&self) -> usize {
        self.read().len()
    }
}
