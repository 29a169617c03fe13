// Frameworks layer: runtime bootstrap, configuration and clocks.

pub mod clock;
pub mod config;
pub mod server;
