// Software transport that advances playback position on a clock
//
// No audio is produced. Hosts with a real output device implement `MediaEngine`
// themselves; this engine keeps the transport semantics for simulation and tests.

use crate::asset::MediaAsset;
use crate::clock::Clock;
use crate::engine::{EngineEvent, EngineObservers, EngineSubscription, MediaEngine};
use std::sync::Arc;
use std::time::Duration;

pub struct ClockEngine {
    clock: Arc<dyn Clock>,
    item: Option<MediaAsset>,
    rate: f32,
    /// Position at `anchor_time`
    anchor_position: Duration,
    anchor_time: Duration,
    observers: EngineObservers,
}

impl ClockEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            item: None,
            rate: 0.0,
            anchor_position: Duration::ZERO,
            anchor_time: Duration::ZERO,
            observers: EngineObservers::new(),
        }
    }

    fn item_duration(&self) -> Option<Duration> {
        self.item.as_ref().and_then(MediaAsset::duration)
    }

    fn position_at(&self, now: Duration) -> Duration {
        if self.item.is_none() {
            return Duration::ZERO;
        }
        let elapsed = now.saturating_sub(self.anchor_time).as_secs_f64() * self.rate as f64;
        let position = Duration::from_secs_f64((self.anchor_position.as_secs_f64() + elapsed).max(0.0));
        match self.item_duration() {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Fold elapsed time into the anchor before the rate or position changes
    fn rebase(&mut self) {
        let now = self.clock.now();
        self.anchor_position = self.position_at(now);
        self.anchor_time = now;
    }
}

impl MediaEngine for ClockEngine {
    fn replace_item(&mut self, asset: Option<&MediaAsset>) {
        let was_moving = self.rate != 0.0;
        self.item = asset.cloned();
        self.rate = 0.0;
        self.anchor_position = Duration::ZERO;
        self.anchor_time = self.clock.now();
        if was_moving {
            self.observers.publish(EngineEvent::RateChanged { rate: 0.0 });
        }
        log::debug!(
            "ClockEngine item replaced: {:?}",
            self.item.as_ref().map(MediaAsset::path)
        );
    }

    fn has_item(&self) -> bool {
        self.item.is_some()
    }

    fn set_rate(&mut self, rate: f32) {
        if self.item.is_none() {
            log::debug!("ClockEngine ignoring rate {} without an item", rate);
            return;
        }
        if rate == self.rate {
            return;
        }
        self.rebase();
        self.rate = rate;
        self.observers.publish(EngineEvent::RateChanged { rate });
    }

    fn rate(&self) -> f32 {
        self.rate
    }

    fn seek(&mut self, to: Duration) {
        if self.item.is_none() {
            return;
        }
        self.anchor_position = match self.item_duration() {
            Some(duration) => to.min(duration),
            None => to,
        };
        self.anchor_time = self.clock.now();
    }

    fn current_time(&self) -> Duration {
        self.position_at(self.clock.now())
    }

    fn duration(&self) -> Option<Duration> {
        self.item_duration()
    }

    fn subscribe(&mut self) -> EngineSubscription {
        self.observers.subscribe()
    }

    fn refresh(&mut self) {
        if self.rate == 0.0 {
            return;
        }
        let position = self.current_time();
        let at_end = match self.item_duration() {
            Some(duration) => self.rate > 0.0 && position >= duration,
            None => false,
        };
        let at_start = self.rate < 0.0 && position.is_zero();

        if at_end || at_start {
            self.rebase();
            self.rate = 0.0;
            self.observers.publish(EngineEvent::RateChanged { rate: 0.0 });
            if at_end {
                self.observers.publish(EngineEvent::PlayedToEnd);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn engine_with_asset(seconds: u64) -> (ClockEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let mut engine = ClockEngine::new(clock.clone());
        let asset = MediaAsset::new("/tmp/a.m4a").with_duration(Some(Duration::from_secs(seconds)));
        engine.replace_item(Some(&asset));
        (engine, clock)
    }

    #[test]
    fn test_position_follows_clock_at_rate() {
        let (mut engine, clock) = engine_with_asset(10);
        engine.play();
        clock.advance(Duration::from_secs(3));
        assert_eq!(engine.current_time(), Duration::from_secs(3));

        engine.pause();
        clock.advance(Duration::from_secs(3));
        assert_eq!(engine.current_time(), Duration::from_secs(3));
    }

    #[test]
    fn test_rate_changes_are_published_once() {
        let (mut engine, _clock) = engine_with_asset(10);
        let events = engine.subscribe();
        engine.play();
        engine.play();
        engine.pause();

        assert_eq!(events.try_next(), Some(EngineEvent::RateChanged { rate: 1.0 }));
        assert_eq!(events.try_next(), Some(EngineEvent::RateChanged { rate: 0.0 }));
        assert_eq!(events.try_next(), None);
    }

    #[test]
    fn test_no_item_ignores_transport() {
        let clock = Arc::new(ManualClock::new());
        let mut engine = ClockEngine::new(clock);
        let events = engine.subscribe();
        engine.play();
        engine.seek(Duration::from_secs(4));
        assert_eq!(engine.rate(), 0.0);
        assert_eq!(engine.current_time(), Duration::ZERO);
        assert_eq!(events.try_next(), None);
    }

    #[test]
    fn test_refresh_publishes_end_of_stream() {
        let (mut engine, clock) = engine_with_asset(2);
        let events = engine.subscribe();
        engine.play();
        clock.advance(Duration::from_secs(3));
        engine.refresh();

        assert_eq!(engine.current_time(), Duration::from_secs(2));
        assert_eq!(events.try_next(), Some(EngineEvent::RateChanged { rate: 1.0 }));
        assert_eq!(events.try_next(), Some(EngineEvent::RateChanged { rate: 0.0 }));
        assert_eq!(events.try_next(), Some(EngineEvent::PlayedToEnd));
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let (mut engine, _clock) = engine_with_asset(5);
        engine.seek(Duration::from_secs(9));
        assert_eq!(engine.current_time(), Duration::from_secs(5));
    }
}
