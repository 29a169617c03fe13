use crate::domain::state::{AreaSnapshot, PlayerId, Song};

// Port for retrieving the current time in epoch milliseconds.
// Implementations must never go backwards.
pub trait Clock: Send + Sync {
    fn now_epoch_ms(&self) -> u64;
}

// Port for the occupants currently inside an area.
pub trait PresenceRegistry: Send + Sync {
    fn occupants(&self) -> Vec<PlayerId>;

    fn occupant_count(&self) -> usize {
        self.occupants().len()
    }
}

// Port for fire-and-forget delivery of snapshots to every subscriber.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, snapshot: AreaSnapshot);
}

// Port for turning a raw song url into a queueable song.
pub trait SongResolver: Send + Sync {
    fn resolve(&self, url: &str, queued_by: Option<PlayerId>) -> Song;
}
