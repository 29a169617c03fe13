use crate::domain::SkipPolicyKind;
use std::{env, time::Duration};

// Runtime/server constants (not playback rules).

pub fn http_port() -> u16 {
    env::var("JUKEBOX_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn heartbeat_interval() -> Duration {
    let millis = env::var("HEARTBEAT_INTERVAL_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(1000);
    Duration::from_millis(millis)
}

pub fn default_song_duration() -> Duration {
    let millis = env::var("DEFAULT_SONG_DURATION_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(30_000);
    Duration::from_millis(millis)
}

pub fn default_area_id() -> String {
    env::var("DEFAULT_AREA_ID")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "jukebox".to_string())
}

pub fn skip_policy() -> SkipPolicyKind {
    let cap = env::var("SKIP_VOTE_CAP")
        .ok()
        .and_then(|value| value.parse::<u32>().ok());
    parse_skip_policy(env::var("SKIP_VOTE_POLICY").ok().as_deref(), cap)
}

// Unknown policy names fall back to the capped quorum.
fn parse_skip_policy(policy: Option<&str>, cap: Option<u32>) -> SkipPolicyKind {
    match policy.map(str::trim) {
        Some(name) if name.eq_ignore_ascii_case("majority") => SkipPolicyKind::Majority,
        Some(name) if !name.is_empty() && !name.eq_ignore_ascii_case("capped") => {
            tracing::warn!(policy = name, "unknown skip vote policy; using capped");
            SkipPolicyKind::Capped { cap: cap.unwrap_or(3) }
        }
        _ => SkipPolicyKind::Capped { cap: cap.unwrap_or(3) },
    }
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const SNAPSHOT_BROADCAST_CAPACITY: usize = 128;
