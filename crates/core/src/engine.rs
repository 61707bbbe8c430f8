// Media engine abstraction and its observation channel

use crate::asset::MediaAsset;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

/// Notifications published by an engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine's signed playback rate changed
    RateChanged { rate: f32 },
    /// The current item reached its end
    PlayedToEnd,
}

/// Receiving end of an engine observation.
/// Dropping it unsubscribes; the engine prunes it on its next publish.
pub struct EngineSubscription {
    rx: Receiver<EngineEvent>,
}

impl EngineSubscription {
    /// Next pending notification, if any
    pub fn try_next(&self) -> Option<EngineEvent> {
        self.rx.try_recv().ok()
    }

    /// Discard every pending notification
    pub fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }
}

/// Fan-out of engine notifications to subscribers
#[derive(Default)]
pub struct EngineObservers {
    senders: Vec<Sender<EngineEvent>>,
}

impl EngineObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> EngineSubscription {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        EngineSubscription { rx }
    }

    pub fn publish(&mut self, event: EngineEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers as of the last publish
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Platform playback engine.
/// Implementations report state changes through `subscribe` rather than return values,
/// so the player's advertised state follows what the engine actually does.
pub trait MediaEngine: Send {
    /// Replace the current item. `None` unloads.
    fn replace_item(&mut self, asset: Option<&MediaAsset>);

    fn has_item(&self) -> bool;

    /// Set the signed playback rate: 0 stops, 1 plays forward, -1 plays backward
    fn set_rate(&mut self, rate: f32);

    fn rate(&self) -> f32;

    fn play(&mut self) {
        self.set_rate(1.0);
    }

    fn pause(&mut self) {
        self.set_rate(0.0);
    }

    fn seek(&mut self, to: Duration);

    fn current_time(&self) -> Duration;

    /// Duration of the current item, when known
    fn duration(&self) -> Option<Duration>;

    fn subscribe(&mut self) -> EngineSubscription;

    /// Publish notifications that depend on elapsed time, such as reaching the end
    fn refresh(&mut self) {}
}
