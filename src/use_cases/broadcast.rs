use crate::domain::{AreaSnapshot, Broadcaster};
use tokio::sync::broadcast;
use tracing::trace;

/// Publishes snapshots onto a tokio broadcast channel; having no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<AreaSnapshot>,
}

impl ChannelBroadcaster {
    pub fn new(tx: broadcast::Sender<AreaSnapshot>) -> Self {
        Self { tx }
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, snapshot: AreaSnapshot) {
        if self.tx.send(snapshot).is_err() {
            trace!("snapshot dropped; no subscribers");
        }
    }
}
