// Area orchestration for spawning and managing jukebox coordinator tasks.

use super::area::area_task;
use super::broadcast::ChannelBroadcaster;
use super::coordinator::{CoordinatorPorts, PlaybackCoordinator};
use super::presence::OccupantSet;
use super::resolver::PlaceholderResolver;
use super::types::{AreaEvent, JukeboxCommand};
use crate::domain::{AreaSnapshot, Clock, CoordinatorError, PlayerId, SkipPolicyKind};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, oneshot, watch};
use tracing::info;

/// Shared configuration for spawning areas.
#[derive(Debug, Clone)]
pub struct AreaSettings {
    /// Capacity for inbound area events.
    pub event_channel_capacity: usize,
    /// Capacity for broadcast snapshots.
    pub snapshot_broadcast_capacity: usize,
    /// Period of the unconditional snapshot re-broadcast.
    pub heartbeat_interval: Duration,
    /// Duration assigned to songs whose metadata is not resolved.
    pub default_song_duration: Duration,
    /// Quorum rule for skip votes.
    pub skip_policy: SkipPolicyKind,
}

/// Errors returned by area registry and handle operations.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaError {
    /// Area already exists and cannot be re-created.
    AlreadyExists,
    /// No area with the requested id.
    NotFound,
    /// Pinned areas live for the whole process.
    Pinned,
    /// The area task has stopped.
    Closed,
    /// The coordinator refused the command.
    Rejected(CoordinatorError),
}

impl fmt::Display for AreaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaError::AlreadyExists => write!(f, "area already exists"),
            AreaError::NotFound => write!(f, "area not found"),
            AreaError::Pinned => write!(f, "area is pinned"),
            AreaError::Closed => write!(f, "area is closed"),
            AreaError::Rejected(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AreaError {}

/// Per-area channels and presence.
#[derive(Clone)]
pub struct AreaHandle {
    /// Identifier clients use to target this area.
    pub area_id: Arc<str>,
    /// Sender for events into the area task.
    pub event_tx: mpsc::Sender<AreaEvent>,
    /// Broadcast sender for raw snapshots.
    pub snapshot_tx: broadcast::Sender<AreaSnapshot>,
    /// Broadcast sender for serialized snapshots.
    pub snapshot_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized snapshot.
    pub snapshot_latest_tx: watch::Sender<Utf8Bytes>,
    /// Players currently inside the area.
    pub occupants: OccupantSet,
    /// Pinned areas cannot be removed.
    pub pinned: bool,
    shutdown: Arc<Notify>,
    /// Wakes every connection and serializer attached to the area on removal.
    conn_shutdown: Arc<Notify>,
    removed: Arc<AtomicBool>,
}

impl AreaHandle {
    /// Sends a command to the area task and waits for its verdict.
    pub async fn submit(&self, command: JukeboxCommand) -> Result<(), AreaError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.event_tx
            .send(AreaEvent::Command {
                command,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| AreaError::Closed)?;
        reply_rx
            .await
            .map_err(|_| AreaError::Closed)?
            .map_err(AreaError::Rejected)
    }

    /// Reads the current snapshot through the area task.
    pub async fn snapshot(&self) -> Result<AreaSnapshot, AreaError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.event_tx
            .send(AreaEvent::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| AreaError::Closed)?;
        reply_rx.await.map_err(|_| AreaError::Closed)
    }

    /// Adds a player to the area. Returns false if the player was already inside.
    pub async fn join(&self, player_id: PlayerId) -> Result<bool, AreaError> {
        if !self.occupants.insert(player_id) {
            return Ok(false);
        }
        self.notify_presence().await?;
        Ok(true)
    }

    pub async fn leave(&self, player_id: &str) -> Result<(), AreaError> {
        if self.occupants.remove(player_id) {
            self.notify_presence().await?;
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AreaSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Resolves once the area has been removed from its registry, immediately if it already was.
    pub async fn closed(&self) {
        let notified = self.conn_shutdown.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent removal cannot slip between.
        notified.as_mut().enable();
        if self.is_removed() {
            return;
        }
        notified.await;
    }

    fn close(&self) {
        self.removed.store(true, Ordering::Release);
        self.conn_shutdown.notify_waiters();
        self.shutdown.notify_one();
    }

    async fn notify_presence(&self) -> Result<(), AreaError> {
        self.event_tx
            .send(AreaEvent::PresenceChanged)
            .await
            .map_err(|_| AreaError::Closed)
    }
}

/// Thread-safe registry for active areas.
pub struct AreaRegistry {
    /// Global settings applied to newly created areas.
    settings: AreaSettings,
    /// Time source shared by every coordinator.
    clock: Arc<dyn Clock>,
    /// Map of area id to active handle.
    areas: RwLock<HashMap<String, AreaHandle>>,
}

impl AreaRegistry {
    /// Creates a new registry with the provided settings.
    pub fn new(settings: AreaSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            areas: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a new area and spawns its coordinator task.
    pub async fn create_area(&self, area_id: String, pinned: bool) -> Result<AreaHandle, AreaError> {
        let mut areas = self.areas.write().await;
        if areas.contains_key(&area_id) {
            return Err(AreaError::AlreadyExists);
        }

        // Channel wiring for the area task.
        let (event_tx, event_rx) = mpsc::channel::<AreaEvent>(self.settings.event_channel_capacity);
        let (snapshot_tx, _snapshot_rx) =
            broadcast::channel::<AreaSnapshot>(self.settings.snapshot_broadcast_capacity);
        let (snapshot_bytes_tx, _snapshot_bytes_rx) =
            broadcast::channel::<Utf8Bytes>(self.settings.snapshot_broadcast_capacity);
        let (snapshot_latest_tx, _snapshot_latest_rx) =
            watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
        let occupants = OccupantSet::new();
        let shutdown = Arc::new(Notify::new());

        let area_id: Arc<str> = Arc::from(area_id.as_str());
        let ports = CoordinatorPorts {
            clock: self.clock.clone(),
            presence: Arc::new(occupants.clone()),
            broadcaster: Arc::new(ChannelBroadcaster::new(snapshot_tx.clone())),
            resolver: Arc::new(PlaceholderResolver::new(
                self.settings.default_song_duration.as_millis() as u64,
            )),
            skip_policy: Arc::from(self.settings.skip_policy.build()),
        };
        let coordinator = PlaybackCoordinator::new(area_id.clone(), ports);

        // Spawn the authoritative coordinator loop for this area.
        tokio::spawn(area_task(
            coordinator,
            event_rx,
            event_tx.downgrade(),
            self.settings.heartbeat_interval,
            shutdown.clone(),
        ));

        let area = AreaHandle {
            area_id: area_id.clone(),
            event_tx,
            snapshot_tx,
            snapshot_bytes_tx,
            snapshot_latest_tx,
            occupants,
            pinned,
            shutdown,
            conn_shutdown: Arc::new(Notify::new()),
            removed: Arc::new(AtomicBool::new(false)),
        };

        areas.insert(area_id.to_string(), area.clone());
        info!(%area_id, pinned, "area created");
        Ok(area)
    }

    /// Returns an area handle for the provided id, if it exists.
    pub async fn get_area(&self, area_id: &str) -> Option<AreaHandle> {
        let areas = self.areas.read().await;
        areas.get(area_id).cloned()
    }

    /// Removes an area and stops its task. Pinned areas are refused.
    pub async fn remove_area(&self, area_id: &str) -> Result<(), AreaError> {
        let mut areas = self.areas.write().await;
        match areas.get(area_id) {
            None => return Err(AreaError::NotFound),
            Some(area) if area.pinned => return Err(AreaError::Pinned),
            Some(_) => {}
        }
        if let Some(area) = areas.remove(area_id) {
            area.close();
        }
        info!(area_id, "area removed");
        Ok(())
    }

    pub async fn area_ids(&self) -> Vec<String> {
        let areas = self.areas.read().await;
        let mut ids: Vec<String> = areas.keys().cloned().collect();
        ids.sort();
        ids
    }
}
