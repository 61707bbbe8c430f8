// Player tuning

use std::time::Duration;

/// Progress polling interval while playing (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Remaining time below which playback counts as finished (milliseconds)
pub const DEFAULT_FINISH_THRESHOLD_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub poll_interval: Duration,
    pub finish_threshold: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            finish_threshold: Duration::from_millis(DEFAULT_FINISH_THRESHOLD_MS),
        }
    }
}
