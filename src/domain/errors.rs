use std::fmt;

// Domain-level errors for playback coordination.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorError {
    // Malformed or unknown command; state is left unchanged.
    InvalidCommand(String),
    // Vote cast while nothing is playing. Swallowed by command handling.
    NoActiveSong,
    // A superseded end-timer fired. Swallowed by the area task.
    StaleTimer { generation: u64 },
}

impl CoordinatorError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        CoordinatorError::InvalidCommand(reason.into())
    }
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::InvalidCommand(reason) => write!(f, "invalid command: {reason}"),
            CoordinatorError::NoActiveSong => write!(f, "no song is playing"),
            CoordinatorError::StaleTimer { generation } => {
                write!(f, "stale song-end timer (generation {generation})")
            }
        }
    }
}

impl std::error::Error for CoordinatorError {}
