// Domain-level playback entities and the snapshot projection sent to observers.

use std::sync::Arc;

pub type PlayerId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub url: String,
    pub title: String,
    pub artist: String,
    pub thumbnail: String,
    pub duration_ms: u64,
    pub queued_by: Option<PlayerId>,
    // Set when the song becomes head of the queue.
    pub started_at_epoch_ms: Option<u64>,
}

impl Song {
    /// Two entries refer to the same queued song when they share url and queuer.
    pub fn same_entry(&self, other: &Song) -> bool {
        self.url == other.url && self.queued_by == other.queued_by
    }
}

/// Immutable projection of one area, built fresh for every broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSnapshot {
    pub id: Arc<str>,
    pub occupants: Vec<PlayerId>,
    pub song_queue: Vec<Song>,
    // Only present while a song is playing.
    pub vote_count: Option<u32>,
    pub elapsed_time_sec: Option<f64>,
}

impl AreaSnapshot {
    pub fn head(&self) -> Option<&Song> {
        self.song_queue.first()
    }
}
