// Wire protocol DTOs and conversions for jukebox clients.
// Envelope fields are snake_case; the area payload uses the camelCase names clients render.

use crate::domain::{AreaSnapshot, CoordinatorError, Song};
use crate::use_cases::JukeboxCommand;
use serde::{Deserialize, Serialize};

pub const AREA_TYPE: &str = "JukeboxArea";

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Identity { player_id: String },
    // Authoritative area state, sent on every change and every heartbeat.
    AreaUpdate(AreaSnapshotDto),
    // Verdict for a command sent on this connection.
    CommandResult(CommandResultDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake; the server assigns an id when none is given.
    Join(JoinPayload),
    // Jukebox commands sent after a successful Join.
    Command(CommandEnvelope),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub player_id: Option<String>,
}

/// Command wrapper. The command body stays untyped here so unknown command types can be
/// answered with an `InvalidCommand` result instead of a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandEnvelope {
    #[serde(default)]
    pub command_id: Option<String>,
    pub command: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum CommandDto {
    #[serde(rename_all = "camelCase")]
    QueueSong {
        url: Option<String>,
        queued_by: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    UpdateState {
        song_queue: Option<Vec<SongDto>>,
        elapsed_time_sec: Option<f64>,
    },
    InitiateSkipVote {
        #[serde(rename = "playerID", alias = "playerId")]
        player_id: Option<String>,
    },
    CastSkipVote {
        #[serde(rename = "playerID", alias = "playerId")]
        player_id: Option<String>,
    },
}

impl CommandDto {
    /// Converts into a domain command. `sender` fills in the player when the body omits it.
    pub fn into_command(self, sender: Option<&str>) -> Result<JukeboxCommand, CoordinatorError> {
        let sender = sender.map(str::to_string);
        match self {
            CommandDto::QueueSong { url, queued_by } => {
                let url = url.ok_or_else(|| CoordinatorError::invalid("url is required"))?;
                Ok(JukeboxCommand::QueueSong {
                    url,
                    queued_by: queued_by.or(sender),
                })
            }
            CommandDto::UpdateState {
                song_queue,
                elapsed_time_sec,
            } => Ok(JukeboxCommand::UpdateState {
                song_queue: song_queue.map(|songs| songs.into_iter().map(Song::from).collect()),
                elapsed_time_sec,
            }),
            CommandDto::InitiateSkipVote { player_id } => Ok(JukeboxCommand::InitiateSkipVote {
                player_id: player_id.or(sender),
            }),
            CommandDto::CastSkipVote { player_id } => {
                let player_id = player_id
                    .or(sender)
                    .ok_or_else(|| CoordinatorError::invalid("playerID is required"))?;
                Ok(JukeboxCommand::CastSkipVote { player_id })
            }
        }
    }
}

/// Parses an untyped command body; unknown types and malformed fields become `InvalidCommand`.
pub fn parse_command(
    value: serde_json::Value,
    sender: Option<&str>,
) -> Result<JukeboxCommand, CoordinatorError> {
    let dto: CommandDto = serde_json::from_value(value)
        .map_err(|e| CoordinatorError::invalid(format!("unrecognized command: {e}")))?;
    dto.into_command(sender)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDto {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_epoch_ms: Option<u64>,
}

impl From<SongDto> for Song {
    fn from(song: SongDto) -> Self {
        Self {
            url: song.url,
            title: song.title,
            artist: song.artist,
            thumbnail: song.thumbnail,
            duration_ms: song.duration_ms,
            queued_by: song.queued_by,
            started_at_epoch_ms: song.started_at_epoch_ms,
        }
    }
}

impl From<&Song> for SongDto {
    fn from(song: &Song) -> Self {
        Self {
            url: song.url.clone(),
            title: song.title.clone(),
            artist: song.artist.clone(),
            thumbnail: song.thumbnail.clone(),
            duration_ms: song.duration_ms,
            queued_by: song.queued_by.clone(),
            started_at_epoch_ms: song.started_at_epoch_ms,
        }
    }
}

/// Area state as clients see it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSnapshotDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub occupants: Vec<String>,
    pub song_queue: Vec<SongDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time_sec: Option<f64>,
}

impl From<&AreaSnapshot> for AreaSnapshotDto {
    fn from(snapshot: &AreaSnapshot) -> Self {
        Self {
            id: snapshot.id.to_string(),
            kind: AREA_TYPE,
            occupants: snapshot.occupants.clone(),
            song_queue: snapshot.song_queue.iter().map(SongDto::from).collect(),
            vote_count: snapshot.vote_count,
            elapsed_time_sec: snapshot.elapsed_time_sec,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandResultDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResultDto {
    pub fn ok(command_id: Option<String>) -> Self {
        Self {
            command_id,
            ok: true,
            error: None,
        }
    }

    pub fn failed(command_id: Option<String>, error: impl ToString) -> Self {
        Self {
            command_id,
            ok: false,
            error: Some(error.to_string()),
        }
    }
}
