use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::vote::CappedQuorum;
use crate::domain::{AreaSnapshot, Broadcaster, Clock, PlayerId, PresenceRegistry, Song};
use crate::use_cases::coordinator::{CoordinatorPorts, PlaybackCoordinator};
use crate::use_cases::resolver::PlaceholderResolver;

pub(crate) const DEFAULT_DURATION_MS: u64 = 30_000;

// Manually driven time source for deterministic coordinator tests.
pub(crate) struct ManualClock(AtomicU64);

impl ManualClock {
    pub(crate) fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub(crate) fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }

    pub(crate) fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now_epoch_ms(&self) -> u64 {
        self.now()
    }
}

pub(crate) struct FixedPresence(Mutex<Vec<PlayerId>>);

impl FixedPresence {
    pub(crate) fn with_count(count: usize) -> Self {
        Self(Mutex::new((0..count).map(|i| format!("player-{i}")).collect()))
    }

    pub(crate) fn set(&self, occupants: Vec<PlayerId>) {
        *self.0.lock().expect("presence mutex poisoned") = occupants;
    }
}

impl PresenceRegistry for FixedPresence {
    fn occupants(&self) -> Vec<PlayerId> {
        self.0.lock().expect("presence mutex poisoned").clone()
    }
}

#[derive(Default)]
pub(crate) struct RecordingBroadcaster(Mutex<Vec<AreaSnapshot>>);

impl RecordingBroadcaster {
    pub(crate) fn count(&self) -> usize {
        self.0.lock().expect("broadcast mutex poisoned").len()
    }

    pub(crate) fn last(&self) -> Option<AreaSnapshot> {
        self.0.lock().expect("broadcast mutex poisoned").last().cloned()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish(&self, snapshot: AreaSnapshot) {
        self.0.lock().expect("broadcast mutex poisoned").push(snapshot);
    }
}

// Shared fakes wired into a coordinator with the default capped quorum.
pub(crate) struct Harness {
    pub clock: Arc<ManualClock>,
    pub presence: Arc<FixedPresence>,
    pub broadcaster: Arc<RecordingBroadcaster>,
}

impl Harness {
    pub(crate) fn new(occupants: usize) -> Self {
        Self {
            clock: Arc::new(ManualClock(AtomicU64::new(1_000))),
            presence: Arc::new(FixedPresence::with_count(occupants)),
            broadcaster: Arc::new(RecordingBroadcaster::default()),
        }
    }

    pub(crate) fn ports(&self) -> CoordinatorPorts {
        CoordinatorPorts {
            clock: self.clock.clone(),
            presence: self.presence.clone(),
            broadcaster: self.broadcaster.clone(),
            resolver: Arc::new(PlaceholderResolver::new(DEFAULT_DURATION_MS)),
            skip_policy: Arc::new(CappedQuorum::default()),
        }
    }

    pub(crate) fn coordinator(&self) -> PlaybackCoordinator {
        PlaybackCoordinator::new(Arc::from("area-1"), self.ports())
    }
}

pub(crate) fn song(url: &str, duration_ms: u64) -> Song {
    Song {
        url: url.to_string(),
        title: String::new(),
        artist: String::new(),
        thumbnail: String::new(),
        duration_ms,
        queued_by: None,
        started_at_epoch_ms: None,
    }
}
