use crate::domain::Clock;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Epoch-millisecond clock that only moves forward.
///
/// Wall-clock time is read once at construction; afterwards time advances with tokio's
/// monotonic `Instant`, so wall-clock jumps never reorder song deadlines and paused tokio
/// time in tests drives it too.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor_epoch_ms: u64,
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        let anchor_epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            anchor_epoch_ms,
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_epoch_ms(&self) -> u64 {
        self.anchor_epoch_ms + self.anchor.elapsed().as_millis() as u64
    }
}
