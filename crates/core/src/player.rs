// Shared player: one engine, one loaded asset, one delegate
//
// Every method runs on the run loop thread. Locks are never held while a delegate,
// the engine observer chain or the scheduler calls back into the player.

use crate::asset::MediaAsset;
use crate::callback::{DelegateSlot, PlayerDelegate, PlayerEvent};
use crate::config::PlayerConfig;
use crate::dispatch::MainQueue;
use crate::engine::{EngineEvent, EngineSubscription, MediaEngine};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::state::{PlaybackState, PlaybackStatus};
use crate::time::remaining_text;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;

struct PlayerInner {
    state: PlaybackState,
    asset: Option<MediaAsset>,
    poll_task: Option<TaskHandle>,
}

pub struct SharedPlayer {
    me: Weak<SharedPlayer>,
    config: PlayerConfig,
    scheduler: Arc<Scheduler>,
    engine: Mutex<Box<dyn MediaEngine>>,
    events: Mutex<EngineSubscription>,
    inner: Mutex<PlayerInner>,
    delegate: Mutex<DelegateSlot>,
}

impl SharedPlayer {
    pub fn new(
        mut engine: Box<dyn MediaEngine>,
        scheduler: Arc<Scheduler>,
        config: PlayerConfig,
    ) -> Arc<Self> {
        log::info!("SharedPlayer::new (poll every {:?})", config.poll_interval);
        let events = engine.subscribe();
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            config,
            scheduler,
            engine: Mutex::new(engine),
            events: Mutex::new(events),
            inner: Mutex::new(PlayerInner {
                state: PlaybackState::Unknown,
                asset: None,
                poll_task: None,
            }),
            delegate: Mutex::new(DelegateSlot::new()),
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state
    }

    pub fn current_asset(&self) -> Option<MediaAsset> {
        self.inner.lock().asset.clone()
    }

    pub fn has_asset(&self) -> bool {
        self.engine.lock().has_item()
    }

    /// Authoritative playback position, read from the engine
    pub fn position(&self) -> Duration {
        let engine = self.engine.lock();
        if engine.has_item() {
            engine.current_time()
        } else {
            Duration::ZERO
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.engine.lock().duration()
    }

    pub fn status(&self) -> PlaybackStatus {
        let (position, duration, has_asset) = {
            let engine = self.engine.lock();
            (engine.current_time(), engine.duration(), engine.has_item())
        };
        PlaybackStatus {
            state: self.state(),
            position: if has_asset { position } else { Duration::ZERO },
            duration,
            has_asset,
        }
    }

    /// Whether the progress loop is armed
    pub fn is_polling(&self) -> bool {
        self.inner
            .lock()
            .poll_task
            .as_ref()
            .is_some_and(|task| !task.is_cancelled())
    }

    /// Handle that pauses this player from any thread
    pub fn stop_request(&self, queue: &MainQueue) -> StopRequest {
        StopRequest {
            player: self.me.clone(),
            queue: queue.clone(),
        }
    }

    // ---- Delegate management ----

    pub fn is_delegate(&self, delegate: &Arc<dyn PlayerDelegate>) -> bool {
        self.delegate.lock().holds(delegate)
    }

    pub fn has_delegate(&self) -> bool {
        !self.delegate.lock().is_empty()
    }

    /// Install `delegate` (or clear with `None`). A different previous holder is told it was detached.
    pub fn set_delegate(&self, delegate: Option<&Arc<dyn PlayerDelegate>>) {
        let previous = self.delegate.lock().replace(delegate);
        if let Some(previous) = previous {
            log::debug!("Delegate detached");
            previous.on_event(PlayerEvent::Detached);
        }
    }

    /// Make `delegate` the active delegate, loading `asset` for it.
    /// Returns false without side effects when it already holds the role.
    pub fn claim(&self, delegate: &Arc<dyn PlayerDelegate>, asset: Option<&MediaAsset>) -> bool {
        if self.is_delegate(delegate) {
            return false;
        }
        self.load(asset);
        self.set_delegate(Some(delegate));
        true
    }

    /// Clear the delegate role if `delegate` holds it. Playback continues.
    pub fn release(&self, delegate: &Arc<dyn PlayerDelegate>) -> bool {
        if !self.is_delegate(delegate) {
            return false;
        }
        self.set_delegate(None);
        true
    }

    // ---- Transport ----

    /// Replace the loaded asset. `None` unloads.
    pub fn load(&self, asset: Option<&MediaAsset>) {
        if self.has_asset() {
            self.notify(PlayerEvent::AssetReplaced);
        }
        self.stop_polling();

        self.engine.lock().replace_item(asset);
        // Notifications queued for the previous item no longer apply
        let stale = self.events.lock().clear();
        if stale > 0 {
            log::trace!("Discarded {} engine events from previous item", stale);
        }

        let old_state = {
            let mut inner = self.inner.lock();
            inner.asset = asset.cloned();
            std::mem::replace(&mut inner.state, PlaybackState::Unknown)
        };
        log::info!("Loaded asset: {:?}", asset.map(MediaAsset::path));

        if old_state != PlaybackState::Unknown {
            self.notify(PlayerEvent::StateChanged {
                old_state,
                new_state: PlaybackState::Unknown,
            });
        }
    }

    pub fn play(&self) {
        {
            let mut engine = self.engine.lock();
            if !engine.has_item() {
                log::debug!("play ignored: no asset loaded");
                return;
            }
            engine.play();
        }
        self.pump_engine_events();
    }

    pub fn pause(&self) {
        self.stop_polling();
        {
            let mut engine = self.engine.lock();
            if !engine.has_item() {
                log::debug!("pause ignored: no asset loaded");
                return;
            }
            engine.pause();
        }
        self.pump_engine_events();
    }

    /// Move the playback position. Play/pause state is unchanged.
    pub fn seek(&self, to: Duration) {
        let position = {
            let mut engine = self.engine.lock();
            if !engine.has_item() {
                log::debug!("seek ignored: no asset loaded");
                return;
            }
            engine.seek(to);
            engine.current_time()
        };
        log::debug!("Seeked to {:?}", position);
    }

    // ---- Engine observation ----

    fn pump_engine_events(&self) {
        loop {
            let event = self.events.lock().try_next();
            match event {
                Some(event) => self.handle_engine_event(event),
                None => break,
            }
        }
    }

    fn handle_engine_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::RateChanged { rate } => match PlaybackState::from_rate(rate) {
                Some(state) => self.transition(state),
                None => log::debug!("Ignoring engine rate {}", rate),
            },
            EngineEvent::PlayedToEnd => self.finish(),
        }
    }

    fn transition(&self, new_state: PlaybackState) {
        let old_state = std::mem::replace(&mut self.inner.lock().state, new_state);
        if old_state == new_state {
            return;
        }
        log::debug!("Player state changed: {:?} -> {:?}", old_state, new_state);

        if new_state != PlaybackState::Playing {
            self.stop_polling();
        }
        self.notify(PlayerEvent::StateChanged {
            old_state,
            new_state,
        });

        match new_state {
            PlaybackState::Playing => {
                let duration = self.duration();
                self.notify(PlayerEvent::Started { duration });
                self.start_polling();
            }
            PlaybackState::Paused => self.notify(PlayerEvent::Stopped),
            PlaybackState::Reserved | PlaybackState::Unknown => {}
        }
    }

    // ---- Progress loop ----

    fn start_polling(&self) {
        let me = self.me.clone();
        let task = self
            .scheduler
            .schedule_repeating(self.config.poll_interval, move || {
                if let Some(player) = me.upgrade() {
                    player.tick();
                }
            });
        // Dropping the previous handle cancels it
        let previous = self.inner.lock().poll_task.replace(task);
        drop(previous);
    }

    fn stop_polling(&self) {
        let task = self.inner.lock().poll_task.take();
        if let Some(task) = task {
            task.cancel();
            log::trace!("Progress polling cancelled");
        }
    }

    fn tick(&self) {
        self.engine.lock().refresh();
        self.pump_engine_events();
        if !self.state().is_playing() {
            return;
        }

        let (position, duration) = {
            let engine = self.engine.lock();
            (engine.current_time(), engine.duration())
        };
        let Some(duration) = duration else {
            log::trace!("Tick skipped: duration unknown");
            return;
        };
        let remaining = duration.saturating_sub(position);
        if remaining < self.config.finish_threshold {
            self.finish();
        } else {
            self.notify(PlayerEvent::Progress {
                position,
                duration,
                remaining_text: remaining_text(duration, position),
            });
        }
    }

    fn finish(&self) {
        {
            let mut engine = self.engine.lock();
            if !engine.has_item() {
                return;
            }
            engine.pause();
            engine.seek(Duration::ZERO);
        }
        log::info!("Playback finished");
        self.pump_engine_events();
        self.notify(PlayerEvent::Finished);
    }

    fn notify(&self, event: PlayerEvent) {
        let delegate = self.delegate.lock().get();
        match delegate {
            Some(delegate) => delegate.on_event(event),
            None => log::trace!("No delegate for {:?}", event),
        }
    }
}

impl Drop for SharedPlayer {
    fn drop(&mut self) {
        if let Some(task) = self.inner.get_mut().poll_task.take() {
            task.cancel();
        }
        self.engine.get_mut().pause();
    }
}

/// App-wide "stop playing audio" request.
///
/// Cloneable and usable from any thread. The pause itself is posted to the main queue,
/// so delegates still only hear from the run loop thread.
#[derive(Clone)]
pub struct StopRequest {
    player: Weak<SharedPlayer>,
    queue: MainQueue,
}

impl StopRequest {
    pub fn send(&self) {
        let player = self.player.clone();
        self.queue.post(move || match player.upgrade() {
            Some(player) => {
                log::info!("Stop requested");
                player.pause();
            }
            None => log::debug!("Stop requested after player was dropped"),
        });
    }
}
