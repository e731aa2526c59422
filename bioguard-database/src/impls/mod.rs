use std::time::{SystemTime, UNIX_EPOCH};

pub mod registry;
pub mod settings;
pub mod warnings;

pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}
