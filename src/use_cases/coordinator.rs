// Playback coordinator: the authoritative queue, skip-vote and end-timer state of one area.
//
// The coordinator is synchronous and owned by exactly one area task. It never sleeps; it only
// records which end-timer generation should be armed and the task schedules it.

use super::types::JukeboxCommand;
use crate::domain::vote::VoteState;
use crate::domain::{
    AreaSnapshot, Broadcaster, Clock, CoordinatorError, PlayerId, PresenceRegistry, SkipPolicy,
    Song, SongResolver,
};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Collaborators injected into a coordinator.
#[derive(Clone)]
pub struct CoordinatorPorts {
    pub clock: Arc<dyn Clock>,
    pub presence: Arc<dyn PresenceRegistry>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub resolver: Arc<dyn SongResolver>,
    pub skip_policy: Arc<dyn SkipPolicy>,
}

/// The single song-end timer that should currently be armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndTimer {
    pub generation: u64,
    pub deadline_epoch_ms: u64,
}

impl EndTimer {
    pub fn remaining(&self, now_epoch_ms: u64) -> Duration {
        Duration::from_millis(self.deadline_epoch_ms.saturating_sub(now_epoch_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Counted { votes: u32, threshold: u32 },
    Skipped,
}

/// Playback position reported by a client, anchored at the time it was received.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ElapsedReport {
    seconds: f64,
    reported_at_epoch_ms: u64,
}

impl ElapsedReport {
    // Position now, assuming playback kept running since the report. Never past the song end.
    fn project(&self, now_epoch_ms: u64, duration_ms: u64) -> f64 {
        let since_report = now_epoch_ms.saturating_sub(self.reported_at_epoch_ms) as f64 / 1000.0;
        let projected = self.seconds + since_report;
        projected.min((duration_ms as f64 / 1000.0).max(self.seconds))
    }
}

pub struct PlaybackCoordinator {
    area_id: Arc<str>,
    queue: VecDeque<Song>,
    votes: VoteState,
    elapsed: Option<ElapsedReport>,
    end_timer: Option<EndTimer>,
    next_generation: u64,
    ports: CoordinatorPorts,
}

impl PlaybackCoordinator {
    pub fn new(area_id: Arc<str>, ports: CoordinatorPorts) -> Self {
        Self {
            area_id,
            queue: VecDeque::new(),
            votes: VoteState::default(),
            elapsed: None,
            end_timer: None,
            next_generation: 1,
            ports,
        }
    }

    pub fn area_id(&self) -> &Arc<str> {
        &self.area_id
    }

    pub fn queue(&self) -> &VecDeque<Song> {
        &self.queue
    }

    pub fn head(&self) -> Option<&Song> {
        self.queue.front()
    }

    pub fn vote_count(&self) -> u32 {
        self.votes.count
    }

    pub fn end_timer(&self) -> Option<EndTimer> {
        self.end_timer
    }

    /// Armed timer together with the time left until it should fire.
    pub fn pending_end_timer(&self) -> Option<(EndTimer, Duration)> {
        let now = self.ports.clock.now_epoch_ms();
        self.end_timer.map(|timer| (timer, timer.remaining(now)))
    }

    /// Applies a client command. Only `InvalidCommand` is ever returned.
    pub fn handle_command(&mut self, command: JukeboxCommand) -> Result<(), CoordinatorError> {
        match command {
            JukeboxCommand::QueueSong { url, queued_by } => {
                let url = url.trim();
                if url.is_empty() {
                    return Err(CoordinatorError::invalid("url is required"));
                }
                let song = self.ports.resolver.resolve(url, queued_by);
                self.enqueue(song);
                Ok(())
            }
            JukeboxCommand::UpdateState {
                song_queue,
                elapsed_time_sec,
            } => self.update_state(song_queue, elapsed_time_sec),
            JukeboxCommand::InitiateSkipVote { player_id } => {
                self.swallow_no_active_song(player_id.as_deref())
            }
            JukeboxCommand::CastSkipVote { player_id } => {
                if player_id.trim().is_empty() {
                    return Err(CoordinatorError::invalid("player_id is required"));
                }
                self.swallow_no_active_song(Some(&player_id))
            }
        }
    }

    fn swallow_no_active_song(&mut self, player_id: Option<&str>) -> Result<(), CoordinatorError> {
        match self.cast_vote(player_id) {
            Ok(_) => Ok(()),
            Err(CoordinatorError::NoActiveSong) => {
                // Votes can race natural song completion on the client side.
                debug!(area_id = %self.area_id, player_id, "skip vote without active song ignored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Appends a song. Only an empty queue starts playback; a playing head is left untouched.
    pub fn enqueue(&mut self, song: Song) {
        let mut song = song;
        song.started_at_epoch_ms = None;
        info!(
            area_id = %self.area_id,
            url = %song.url,
            queued_by = song.queued_by.as_deref(),
            duration_ms = song.duration_ms,
            "song queued"
        );
        self.queue.push_back(song);
        if self.queue.len() == 1 {
            self.start_head();
        }
        self.broadcast();
    }

    /// Handles a fired end-timer. Fires from superseded generations are rejected untouched.
    pub fn on_end_timer(&mut self, generation: u64) -> Result<(), CoordinatorError> {
        match self.end_timer {
            Some(timer) if timer.generation == generation => {}
            _ => return Err(CoordinatorError::StaleTimer { generation }),
        }

        if let Some(finished) = self.queue.front() {
            debug!(area_id = %self.area_id, url = %finished.url, generation, "song finished");
        }
        self.advance_head();
        self.broadcast();
        Ok(())
    }

    pub fn cast_vote(&mut self, player_id: Option<&str>) -> Result<VoteOutcome, CoordinatorError> {
        if self.queue.is_empty() {
            return Err(CoordinatorError::NoActiveSong);
        }

        let votes = self.votes.cast();
        let occupants = self.ports.presence.occupant_count();
        let threshold = self.ports.skip_policy.threshold(occupants);
        debug!(area_id = %self.area_id, player_id, votes, threshold, "skip vote cast");

        let outcome = if self.ports.skip_policy.is_reached(votes, occupants) {
            if let Some(skipped) = self.queue.front() {
                info!(area_id = %self.area_id, url = %skipped.url, votes, "song skipped by vote");
            }
            self.advance_head();
            VoteOutcome::Skipped
        } else {
            VoteOutcome::Counted { votes, threshold }
        };

        self.broadcast();
        Ok(outcome)
    }

    /// Replaces the whole queue. A changed head restarts playback and clears votes; an
    /// unchanged head keeps its start time and is re-armed for the same deadline.
    pub fn replace_queue(&mut self, songs: Vec<Song>) -> Result<(), CoordinatorError> {
        self.apply_queue(songs)?;
        self.broadcast();
        Ok(())
    }

    /// Records the elapsed playback time reported for the head song.
    pub fn set_elapsed(&mut self, seconds: f64) -> Result<(), CoordinatorError> {
        self.apply_elapsed(seconds)?;
        self.broadcast();
        Ok(())
    }

    pub fn heartbeat(&self) {
        self.broadcast();
    }

    pub fn presence_changed(&self) {
        self.broadcast();
    }

    pub fn snapshot(&self) -> AreaSnapshot {
        let occupants: BTreeSet<PlayerId> = self.ports.presence.occupants().into_iter().collect();
        let head = self.queue.front();
        let elapsed_time_sec = match (head, self.elapsed) {
            (Some(head), Some(report)) => {
                Some(report.project(self.ports.clock.now_epoch_ms(), head.duration_ms))
            }
            _ => None,
        };
        AreaSnapshot {
            id: self.area_id.clone(),
            occupants: occupants.into_iter().collect(),
            song_queue: self.queue.iter().cloned().collect(),
            vote_count: head.map(|_| self.votes.count),
            elapsed_time_sec,
        }
    }

    fn update_state(
        &mut self,
        song_queue: Option<Vec<Song>>,
        elapsed_time_sec: Option<f64>,
    ) -> Result<(), CoordinatorError> {
        if song_queue.is_none() && elapsed_time_sec.is_none() {
            return Ok(());
        }

        // Validate everything up front so a rejected update leaves state untouched.
        if let Some(songs) = &song_queue {
            validate_songs(songs)?;
        }
        if let Some(seconds) = elapsed_time_sec {
            validate_elapsed(seconds)?;
        }

        if let Some(songs) = song_queue {
            self.apply_queue(songs)?;
        }
        if let Some(seconds) = elapsed_time_sec {
            self.apply_elapsed(seconds)?;
        }
        self.broadcast();
        Ok(())
    }

    fn apply_queue(&mut self, songs: Vec<Song>) -> Result<(), CoordinatorError> {
        validate_songs(&songs)?;

        let previous_head = self.queue.front().cloned();
        self.queue = songs.into_iter().collect();
        // Only the head may carry a start time.
        for song in self.queue.iter_mut().skip(1) {
            song.started_at_epoch_ms = None;
        }

        // Cancels whatever was armed; a fresh generation is issued below if needed.
        self.end_timer = None;

        let same_head = match (previous_head.as_ref(), self.queue.front()) {
            (Some(old), Some(new)) => old.same_entry(new),
            _ => false,
        };

        if same_head {
            let started_at = previous_head.and_then(|old| old.started_at_epoch_ms);
            match started_at {
                Some(started_at) => {
                    if let Some(head) = self.queue.front_mut() {
                        head.started_at_epoch_ms = Some(started_at);
                        let deadline = started_at.saturating_add(head.duration_ms);
                        self.arm(deadline);
                    }
                }
                None => self.start_head(),
            }
        } else {
            self.votes.reset();
            self.elapsed = None;
            if self.queue.is_empty() {
                info!(area_id = %self.area_id, "queue cleared");
            } else {
                self.start_head();
            }
        }

        info!(area_id = %self.area_id, len = self.queue.len(), same_head, "queue replaced");
        Ok(())
    }

    fn apply_elapsed(&mut self, seconds: f64) -> Result<(), CoordinatorError> {
        validate_elapsed(seconds)?;
        if self.queue.is_empty() {
            debug!(area_id = %self.area_id, seconds, "elapsed time ignored without active song");
            return Ok(());
        }
        self.elapsed = Some(ElapsedReport {
            seconds,
            reported_at_epoch_ms: self.ports.clock.now_epoch_ms(),
        });
        Ok(())
    }

    // Removes the head and starts the next song, if any.
    fn advance_head(&mut self) {
        self.queue.pop_front();
        self.votes.reset();
        self.elapsed = None;
        self.end_timer = None;
        self.start_head();
    }

    fn start_head(&mut self) {
        let now = self.ports.clock.now_epoch_ms();
        let Some(head) = self.queue.front_mut() else {
            return;
        };
        head.started_at_epoch_ms = Some(now);
        let deadline = now.saturating_add(head.duration_ms);
        self.arm(deadline);
    }

    fn arm(&mut self, deadline_epoch_ms: u64) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.end_timer = Some(EndTimer {
            generation,
            deadline_epoch_ms,
        });
        debug!(area_id = %self.area_id, generation, deadline_epoch_ms, "end timer armed");
    }

    fn broadcast(&self) {
        self.ports.broadcaster.publish(self.snapshot());
    }
}

fn validate_songs(songs: &[Song]) -> Result<(), CoordinatorError> {
    if songs.iter().any(|song| song.url.trim().is_empty()) {
        return Err(CoordinatorError::invalid("every queued song needs a url"));
    }
    Ok(())
}

fn validate_elapsed(seconds: f64) -> Result<(), CoordinatorError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(CoordinatorError::invalid(
            "elapsedTimeSec must be a non-negative number",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{Harness, song};

    #[test]
    fn when_song_queued_into_empty_queue_then_head_is_stamped_and_timer_armed() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        h.clock.set(5_000);

        c.enqueue(song("a", 1_000));

        assert_eq!(c.head().and_then(|s| s.started_at_epoch_ms), Some(5_000));
        let timer = c.end_timer().expect("timer should be armed");
        assert_eq!(timer.deadline_epoch_ms, 6_000);
        assert_eq!(c.pending_end_timer().map(|(_, d)| d), Some(Duration::from_millis(1_000)));

        let last = h.broadcaster.last().expect("broadcast expected");
        assert_eq!(last.song_queue.len(), 1);
        assert!(last.song_queue[0].started_at_epoch_ms.unwrap_or(0) > 0);
    }

    #[test]
    fn when_song_queued_while_playing_then_head_and_timer_are_untouched() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 1_000));
        let timer = c.end_timer();
        let started = c.head().and_then(|s| s.started_at_epoch_ms);

        h.clock.advance(300);
        c.enqueue(song("b", 2_000));

        assert_eq!(c.end_timer(), timer);
        assert_eq!(c.head().and_then(|s| s.started_at_epoch_ms), started);
        assert_eq!(c.queue()[1].started_at_epoch_ms, None);
        assert_eq!(h.broadcaster.count(), 2);
    }

    #[test]
    fn when_end_timer_fires_then_exactly_one_song_is_removed_and_next_is_armed() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 1_000));
        c.enqueue(song("b", 2_000));
        let first = c.end_timer().expect("armed");

        h.clock.advance(1_000);
        c.on_end_timer(first.generation).expect("current timer");

        assert_eq!(c.queue().len(), 1);
        assert_eq!(c.head().map(|s| s.url.as_str()), Some("b"));
        assert_eq!(c.head().and_then(|s| s.started_at_epoch_ms), Some(h.clock.now()));
        let next = c.end_timer().expect("next song armed");
        assert_ne!(next.generation, first.generation);
        assert_eq!(next.deadline_epoch_ms, h.clock.now() + 2_000);
    }

    #[test]
    fn when_last_song_ends_then_queue_is_empty_and_no_timer_remains() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 1_000));
        let timer = c.end_timer().expect("armed");

        h.clock.advance(1_000);
        c.on_end_timer(timer.generation).expect("current timer");

        assert!(c.queue().is_empty());
        assert_eq!(c.end_timer(), None);
        let last = h.broadcaster.last().expect("broadcast expected");
        assert!(last.song_queue.is_empty());
        assert_eq!(last.vote_count, None);
    }

    #[test]
    fn when_stale_timer_fires_then_it_is_rejected_without_side_effects() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 1_000));
        c.enqueue(song("b", 1_000));
        let stale = c.end_timer().expect("armed").generation;
        c.cast_vote(Some("p1")).expect("vote");
        let broadcasts = h.broadcaster.count();

        let err = c.on_end_timer(stale).expect_err("stale fire must be rejected");

        assert_eq!(err, CoordinatorError::StaleTimer { generation: stale });
        assert_eq!(c.queue().len(), 1);
        assert_eq!(h.broadcaster.count(), broadcasts);
    }

    #[test]
    fn when_three_votes_with_four_occupants_then_head_is_skipped_once() {
        let h = Harness::new(4);
        let mut c = h.coordinator();
        c.enqueue(song("a", 10_000));
        c.enqueue(song("b", 10_000));
        let original = c.end_timer().expect("armed");

        assert_eq!(
            c.cast_vote(Some("p1")),
            Ok(VoteOutcome::Counted { votes: 1, threshold: 3 })
        );
        assert_eq!(
            c.cast_vote(Some("p2")),
            Ok(VoteOutcome::Counted { votes: 2, threshold: 3 })
        );
        assert_eq!(c.vote_count(), 2);
        assert_eq!(c.cast_vote(Some("p3")), Ok(VoteOutcome::Skipped));

        assert_eq!(c.queue().len(), 1);
        assert_eq!(c.head().map(|s| s.url.as_str()), Some("b"));
        assert_eq!(c.vote_count(), 0);
        assert_eq!(h.broadcaster.last().and_then(|s| s.vote_count), Some(0));

        // The pre-empted timer arriving late must not remove "b".
        assert!(c.on_end_timer(original.generation).is_err());
        assert_eq!(c.queue().len(), 1);
    }

    #[test]
    fn when_single_occupant_votes_then_song_is_skipped_immediately() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 10_000));

        assert_eq!(c.cast_vote(Some("p1")), Ok(VoteOutcome::Skipped));
        assert!(c.queue().is_empty());
        assert_eq!(c.end_timer(), None);
    }

    #[test]
    fn when_vote_cast_on_empty_queue_then_command_is_a_silent_no_op() {
        let h = Harness::new(3);
        let mut c = h.coordinator();

        assert_eq!(c.cast_vote(Some("p1")), Err(CoordinatorError::NoActiveSong));
        let result = c.handle_command(JukeboxCommand::CastSkipVote {
            player_id: "p1".to_string(),
        });

        assert_eq!(result, Ok(()));
        assert_eq!(h.broadcaster.count(), 0);
    }

    #[test]
    fn when_head_ends_naturally_then_votes_reset() {
        let h = Harness::new(4);
        let mut c = h.coordinator();
        c.enqueue(song("a", 1_000));
        c.enqueue(song("b", 1_000));
        c.cast_vote(Some("p1")).expect("vote");
        assert_eq!(c.vote_count(), 1);

        let timer = c.end_timer().expect("armed");
        c.on_end_timer(timer.generation).expect("current timer");

        assert_eq!(c.vote_count(), 0);
    }

    #[test]
    fn when_queue_replaced_while_empty_then_head_is_stamped_and_armed() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        h.clock.set(42_000);

        c.handle_command(JukeboxCommand::UpdateState {
            song_queue: Some(vec![song("x", 3_000)]),
            elapsed_time_sec: None,
        })
        .expect("valid update");

        assert_eq!(c.head().and_then(|s| s.started_at_epoch_ms), Some(42_000));
        assert_eq!(c.end_timer().map(|t| t.deadline_epoch_ms), Some(45_000));
        assert_eq!(h.broadcaster.count(), 1);
    }

    #[test]
    fn when_queue_replaced_with_new_head_then_timer_is_rearmed_and_votes_reset() {
        let h = Harness::new(4);
        let mut c = h.coordinator();
        c.enqueue(song("a", 10_000));
        c.cast_vote(Some("p1")).expect("vote");
        let old = c.end_timer().expect("armed");

        h.clock.advance(500);
        c.replace_queue(vec![song("y", 2_000), song("z", 2_000)])
            .expect("valid queue");

        let new = c.end_timer().expect("armed");
        assert_ne!(new.generation, old.generation);
        assert_eq!(new.deadline_epoch_ms, h.clock.now() + 2_000);
        assert_eq!(c.vote_count(), 0);
        assert!(c.on_end_timer(old.generation).is_err());
    }

    #[test]
    fn when_queue_replaced_with_same_head_then_start_time_and_votes_survive() {
        let h = Harness::new(4);
        let mut c = h.coordinator();
        c.enqueue(song("a", 10_000));
        c.cast_vote(Some("p1")).expect("vote");
        let old = c.end_timer().expect("armed");
        let started = c.head().and_then(|s| s.started_at_epoch_ms);

        h.clock.advance(2_000);
        c.replace_queue(vec![song("a", 10_000), song("c", 1_000)])
            .expect("valid queue");

        let new = c.end_timer().expect("armed");
        assert_ne!(new.generation, old.generation);
        assert_eq!(new.deadline_epoch_ms, old.deadline_epoch_ms);
        assert_eq!(c.head().and_then(|s| s.started_at_epoch_ms), started);
        assert_eq!(c.vote_count(), 1);
    }

    #[test]
    fn when_queue_replaced_with_empty_list_then_timer_is_cancelled() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 10_000));

        c.replace_queue(Vec::new()).expect("valid queue");

        assert!(c.queue().is_empty());
        assert_eq!(c.end_timer(), None);
    }

    #[test]
    fn when_elapsed_time_set_then_queue_timer_and_votes_are_unchanged() {
        let h = Harness::new(4);
        let mut c = h.coordinator();
        c.enqueue(song("a", 10_000));
        c.enqueue(song("b", 10_000));
        c.cast_vote(Some("p1")).expect("vote");
        let timer = c.end_timer();
        let before = h.broadcaster.count();

        c.set_elapsed(4.5).expect("valid elapsed");

        assert_eq!(c.end_timer(), timer);
        assert_eq!(c.vote_count(), 1);
        assert_eq!(c.queue().len(), 2);
        assert_eq!(h.broadcaster.count(), before + 1);
        assert_eq!(h.broadcaster.last().and_then(|s| s.elapsed_time_sec), Some(4.5));
    }

    #[test]
    fn when_time_passes_after_elapsed_report_then_heartbeat_carries_advanced_position() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 60_000));
        c.set_elapsed(4.5).expect("valid elapsed");

        h.clock.advance(10_000);
        c.heartbeat();

        let last = h.broadcaster.last().expect("broadcast expected");
        assert_eq!(last.elapsed_time_sec, Some(14.5));
    }

    #[test]
    fn when_elapsed_projection_passes_song_end_then_it_stops_at_duration() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 8_000));
        c.set_elapsed(5.0).expect("valid elapsed");

        h.clock.advance(30_000);

        assert_eq!(c.snapshot().elapsed_time_sec, Some(8.0));
    }

    #[test]
    fn when_update_state_has_no_fields_then_nothing_is_broadcast() {
        let h = Harness::new(1);
        let mut c = h.coordinator();

        c.handle_command(JukeboxCommand::UpdateState {
            song_queue: None,
            elapsed_time_sec: None,
        })
        .expect("no-op update");

        assert_eq!(h.broadcaster.count(), 0);
    }

    #[test]
    fn when_update_state_is_invalid_then_state_is_unchanged() {
        let h = Harness::new(1);
        let mut c = h.coordinator();
        c.enqueue(song("a", 10_000));
        let before = h.broadcaster.count();

        let result = c.handle_command(JukeboxCommand::UpdateState {
            song_queue: Some(vec![song("b", 1_000)]),
            elapsed_time_sec: Some(f64::NAN),
        });

        assert!(matches!(result, Err(CoordinatorError::InvalidCommand(_))));
        assert_eq!(c.head().map(|s| s.url.as_str()), Some("a"));
        assert_eq!(h.broadcaster.count(), before);
    }

    #[test]
    fn when_queue_song_has_blank_url_then_command_is_invalid() {
        let h = Harness::new(1);
        let mut c = h.coordinator();

        let result = c.handle_command(JukeboxCommand::QueueSong {
            url: "   ".to_string(),
            queued_by: None,
        });

        assert!(matches!(result, Err(CoordinatorError::InvalidCommand(_))));
        assert!(c.queue().is_empty());
        assert_eq!(h.broadcaster.count(), 0);
    }

    #[test]
    fn when_queue_song_command_then_resolver_metadata_is_used() {
        let h = Harness::new(1);
        let mut c = h.coordinator();

        c.handle_command(JukeboxCommand::QueueSong {
            url: "https://example.com/song".to_string(),
            queued_by: Some("p1".to_string()),
        })
        .expect("valid command");

        let head = c.head().expect("queued");
        assert_eq!(head.duration_ms, crate::use_cases::test_support::DEFAULT_DURATION_MS);
        assert_eq!(head.queued_by.as_deref(), Some("p1"));
        assert!(head.title.is_empty());
    }

    #[test]
    fn when_heartbeat_without_changes_then_broadcast_matches_last_change() {
        let h = Harness::new(2);
        let mut c = h.coordinator();
        c.enqueue(song("a", 10_000));
        let last_change = h.broadcaster.last().expect("broadcast expected");

        h.clock.advance(1_000);
        c.heartbeat();

        assert_eq!(h.broadcaster.count(), 2);
        assert_eq!(h.broadcaster.last(), Some(last_change));
    }

    #[test]
    fn when_snapshot_taken_then_occupants_are_sorted_and_unique() {
        let h = Harness::new(0);
        h.presence.set(vec!["b".into(), "a".into(), "b".into()]);
        let c = h.coordinator();

        let snapshot = c.snapshot();

        assert_eq!(snapshot.occupants, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(snapshot.vote_count, None);
        assert_eq!(&*snapshot.id, "area-1");
    }
}
