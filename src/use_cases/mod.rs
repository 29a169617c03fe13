// Use cases layer: application workflows for the jukebox server.

pub mod area;
pub mod broadcast;
pub mod coordinator;
pub mod presence;
pub mod registry;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{CoordinatorPorts, EndTimer, PlaybackCoordinator, VoteOutcome};
pub use registry::{AreaError, AreaHandle, AreaRegistry, AreaSettings};
pub use types::{AreaEvent, JukeboxCommand};
