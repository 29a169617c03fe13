// Domain layer: playback entities, skip-vote rules and the ports the coordinator consumes.

pub mod errors;
pub mod ports;
pub mod state;
pub mod vote;

pub use errors::CoordinatorError;
pub use ports::{Broadcaster, Clock, PresenceRegistry, SongResolver};
pub use state::{AreaSnapshot, PlayerId, Song};
pub use vote::{SkipPolicy, SkipPolicyKind, VoteState};
