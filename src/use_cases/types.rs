// Use-case level inputs for the area task.

use crate::domain::{AreaSnapshot, CoordinatorError, PlayerId, Song};
use tokio::sync::oneshot;

/// Commands accepted by a jukebox area. Wire parsing maps unknown tags to `InvalidCommand`
/// before anything reaches this type.
#[derive(Debug, Clone, PartialEq)]
pub enum JukeboxCommand {
    QueueSong {
        url: String,
        queued_by: Option<PlayerId>,
    },
    UpdateState {
        song_queue: Option<Vec<Song>>,
        elapsed_time_sec: Option<f64>,
    },
    // Opening a vote counts as the initiator's first cast.
    InitiateSkipVote {
        player_id: Option<PlayerId>,
    },
    CastSkipVote {
        player_id: PlayerId,
    },
}

impl JukeboxCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            JukeboxCommand::QueueSong { .. } => "QueueSong",
            JukeboxCommand::UpdateState { .. } => "UpdateState",
            JukeboxCommand::InitiateSkipVote { .. } => "InitiateSkipVote",
            JukeboxCommand::CastSkipVote { .. } => "CastSkipVote",
        }
    }
}

pub type CommandReply = oneshot::Sender<Result<(), CoordinatorError>>;

/// Everything that mutates or reads an area goes through its task as one of these.
#[derive(Debug)]
pub enum AreaEvent {
    Command {
        command: JukeboxCommand,
        reply: Option<CommandReply>,
    },
    // Posted by the scheduled end-timer of the given generation.
    SongEnded {
        generation: u64,
    },
    PresenceChanged,
    Snapshot {
        reply: oneshot::Sender<AreaSnapshot>,
    },
}
