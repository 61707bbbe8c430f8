// Delegate notifications from the shared player
//
// The player talks to exactly one delegate at a time. The slot holds it weakly so a
// recycled or dropped cell never keeps receiving events.

use crate::state::PlaybackState;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Player event types
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Player state changed
    StateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
    },

    /// Forward playback began
    Started { duration: Option<Duration> },

    /// Playback stopped
    Stopped,

    /// Periodic position update while playing
    Progress {
        position: Duration,
        duration: Duration,
        remaining_text: String,
    },

    /// Playback reached the end and was rewound
    Finished,

    /// The loaded asset is about to be swapped for another
    AssetReplaced,

    /// The receiver is no longer the player's delegate
    Detached,
}

/// Receiver of player events.
/// Implementations run on the run loop thread and must not block.
pub trait PlayerDelegate: Send + Sync {
    fn on_event(&self, event: PlayerEvent);
}

/// Holds at most one delegate
#[derive(Default)]
pub struct DelegateSlot {
    current: Option<Weak<dyn PlayerDelegate>>,
}

impl DelegateSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current delegate, if one is installed and still alive
    pub fn get(&self) -> Option<Arc<dyn PlayerDelegate>> {
        self.current.as_ref().and_then(Weak::upgrade)
    }

    pub fn holds(&self, delegate: &Arc<dyn PlayerDelegate>) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| same_delegate(current, delegate))
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }

    /// Install `delegate`, returning the previous holder when it differs and is still alive.
    /// The caller is responsible for telling that holder it was detached.
    pub fn replace(
        &mut self,
        delegate: Option<&Arc<dyn PlayerDelegate>>,
    ) -> Option<Arc<dyn PlayerDelegate>> {
        if let Some(new) = delegate {
            if self.holds(new) {
                return None;
            }
        }
        let previous = self.current.take().and_then(|weak| weak.upgrade());
        self.current = delegate.map(Arc::downgrade);
        previous
    }
}

fn same_delegate(weak: &Weak<dyn PlayerDelegate>, strong: &Arc<dyn PlayerDelegate>) -> bool {
    // Compare data addresses only; vtable pointers may differ across codegen units
    weak.as_ptr() as *const () == Arc::as_ptr(strong) as *const ()
}
