use crate::domain::{PlayerId, Song, SongResolver};

/// Resolver used until a catalog lookup exists: metadata stays blank and every song gets
/// the configured fallback duration.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderResolver {
    default_duration_ms: u64,
}

impl PlaceholderResolver {
    pub fn new(default_duration_ms: u64) -> Self {
        Self {
            default_duration_ms,
        }
    }
}

impl SongResolver for PlaceholderResolver {
    fn resolve(&self, url: &str, queued_by: Option<PlayerId>) -> Song {
        Song {
            url: url.to_string(),
            title: String::new(),
            artist: String::new(),
            thumbnail: String::new(),
            duration_ms: self.default_duration_ms,
            queued_by,
            started_at_epoch_ms: None,
        }
    }
}
