// Per-area task: the single writer that owns a coordinator and serializes every event,
// end-timer fire and heartbeat tick through one loop.

use super::coordinator::{EndTimer, PlaybackCoordinator};
use super::types::AreaEvent;
use crate::domain::CoordinatorError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Handle to a spawned end-timer. Dropping it cancels the timer.
struct ScheduledTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Drop for ScheduledTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn schedule_end_timer(
    timer: EndTimer,
    delay: Duration,
    events: mpsc::WeakSender<AreaEvent>,
) -> ScheduledTimer {
    let generation = timer.generation;
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        // The area may already be gone; the fire is simply dropped then.
        if let Some(tx) = events.upgrade() {
            let _ = tx.send(AreaEvent::SongEnded { generation }).await;
        }
    });
    ScheduledTimer { generation, handle }
}

// Makes the scheduled timer match what the coordinator says should be armed.
fn sync_end_timer(
    coordinator: &PlaybackCoordinator,
    scheduled: &mut Option<ScheduledTimer>,
    events: &mpsc::WeakSender<AreaEvent>,
) {
    match (coordinator.pending_end_timer(), scheduled.as_ref()) {
        (Some((timer, _)), Some(current)) if current.generation == timer.generation => {}
        (Some((timer, delay)), _) => {
            debug!(
                area_id = %coordinator.area_id(),
                generation = timer.generation,
                delay_ms = delay.as_millis() as u64,
                "scheduling end timer"
            );
            *scheduled = Some(schedule_end_timer(timer, delay, events.clone()));
        }
        (None, _) => *scheduled = None,
    }
}

fn handle_event(coordinator: &mut PlaybackCoordinator, event: AreaEvent) {
    match event {
        AreaEvent::Command { command, reply } => {
            let kind = command.kind();
            let result = coordinator.handle_command(command);
            if let Err(e) = &result {
                warn!(area_id = %coordinator.area_id(), command = kind, error = %e, "command rejected");
            }
            if let Some(reply) = reply {
                // The caller may have given up waiting.
                let _ = reply.send(result);
            }
        }
        AreaEvent::SongEnded { generation } => match coordinator.on_end_timer(generation) {
            Ok(()) => {}
            Err(CoordinatorError::StaleTimer { generation }) => {
                debug!(area_id = %coordinator.area_id(), generation, "stale end timer ignored");
            }
            Err(e) => {
                warn!(area_id = %coordinator.area_id(), error = %e, "end timer failed");
            }
        },
        AreaEvent::PresenceChanged => coordinator.presence_changed(),
        AreaEvent::Snapshot { reply } => {
            let _ = reply.send(coordinator.snapshot());
        }
    }
}

pub async fn area_task(
    mut coordinator: PlaybackCoordinator,
    mut event_rx: mpsc::Receiver<AreaEvent>,
    events: mpsc::WeakSender<AreaEvent>,
    heartbeat_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let area_id = coordinator.area_id().clone();
    info!(%area_id, "area task started");

    // The first tick completes immediately, so new areas announce themselves right away.
    let mut heartbeat = tokio::time::interval(heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut scheduled: Option<ScheduledTimer> = None;

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // Exit cleanly when the area is removed.
                break;
            }
            _ = heartbeat.tick() => {
                coordinator.heartbeat();
            }
            event = event_rx.recv() => {
                match event {
                    Some(event) => handle_event(&mut coordinator, event),
                    None => break,
                }
            }
        }

        sync_end_timer(&coordinator, &mut scheduled, &events);
    }

    // Dropping the handle aborts any pending end timer.
    drop(scheduled);
    info!(%area_id, "area task stopped");
}
