// Core types for the voice message bubble: shared player, delegate slot and run loop

pub mod asset;
pub mod callback;
pub mod clock;
pub mod clock_engine;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod player;
pub mod runloop;
pub mod scheduler;
pub mod state;
pub mod time;

// Re-export commonly used types
pub use asset::MediaAsset;
pub use callback::{DelegateSlot, PlayerDelegate, PlayerEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use clock_engine::ClockEngine;
pub use config::PlayerConfig;
pub use dispatch::MainQueue;
pub use engine::{EngineEvent, EngineObservers, EngineSubscription, MediaEngine};
pub use player::{SharedPlayer, StopRequest};
pub use runloop::RunLoop;
pub use scheduler::{Scheduler, TaskHandle};
pub use state::{PlaybackState, PlaybackStatus};
pub use time::{duration_text, progress_fraction, remaining_text, PLACEHOLDER_TIME_TEXT};
