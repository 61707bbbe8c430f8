// What the core asks of the host's bubble view

use parking_lot::Mutex;
use voicebubble_core::PLACEHOLDER_TIME_TEXT;

/// Transport button shown in the bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affordance {
    #[default]
    Play,
    Pause,
}

/// Rendering surface of one bubble. Calls arrive on the run loop thread.
pub trait BubbleView: Send + Sync {
    fn show_affordance(&self, affordance: Affordance);

    /// Slider value in [0, 1]
    fn set_slider(&self, value: f32);

    fn set_time_text(&self, text: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct BubbleSnapshot {
    pub affordance: Affordance,
    pub slider: f32,
    pub time_text: String,
}

impl Default for BubbleSnapshot {
    fn default() -> Self {
        Self {
            affordance: Affordance::Play,
            slider: 0.0,
            time_text: PLACEHOLDER_TIME_TEXT.to_string(),
        }
    }
}

/// In-memory view state for hosts that render from a snapshot each frame
#[derive(Default)]
pub struct BubbleViewModel {
    state: Mutex<BubbleSnapshot>,
}

impl BubbleViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BubbleSnapshot {
        self.state.lock().clone()
    }
}

impl BubbleView for BubbleViewModel {
    fn show_affordance(&self, affordance: Affordance) {
        self.state.lock().affordance = affordance;
    }

    fn set_slider(&self, value: f32) {
        self.state.lock().slider = value.clamp(0.0, 1.0);
    }

    fn set_time_text(&self, text: &str) {
        self.state.lock().time_text = text.to_string();
    }
}
