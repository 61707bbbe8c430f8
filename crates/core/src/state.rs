// Playback state derived from the engine's observed rate

use std::time::Duration;

/// Tolerance used when matching engine rates against the canonical values
const RATE_EPSILON: f32 = 1e-3;

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing observed yet for the current asset
    #[default]
    Unknown,
    /// Engine is running in reverse (rate -1)
    Reserved,
    /// Engine is running forward (rate 1)
    Playing,
    /// Engine is stopped (rate 0)
    Paused,
}

impl PlaybackState {
    /// State implied by an engine rate.
    /// Rates other than 0, 1 and -1 carry no state and return `None`.
    pub fn from_rate(rate: f32) -> Option<Self> {
        if rate.abs() < RATE_EPSILON {
            Some(PlaybackState::Paused)
        } else if (rate - 1.0).abs() < RATE_EPSILON {
            Some(PlaybackState::Playing)
        } else if (rate + 1.0).abs() < RATE_EPSILON {
            Some(PlaybackState::Reserved)
        } else {
            None
        }
    }

    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }
}

/// Playback status information
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    /// Current engine position
    pub position: Duration,
    /// Duration of the loaded asset, when known
    pub duration: Option<Duration>,
    pub has_asset: bool,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            state: PlaybackState::Unknown,
            position: Duration::ZERO,
            duration: None,
            has_asset: false,
        }
    }
}
