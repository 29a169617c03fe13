use crate::use_cases::AreaRegistry;
use std::sync::Arc;

pub struct AppState {
    // Every live jukebox area and its coordinator task.
    pub area_registry: Arc<AreaRegistry>,
    // Area used when a client does not name one.
    pub default_area_id: Arc<str>,
}
