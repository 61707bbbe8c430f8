// Cell controller: one per visible voice message bubble
//
// Mediates between taps on the bubble and the shared player. Only the cell that holds
// the player's delegate role receives progress; every other cell keeps the position it
// last saw.

use crate::view::{Affordance, BubbleView};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use voicebubble_core::{
    progress_fraction, MediaAsset, PlaybackState, PlayerDelegate, PlayerEvent, SharedPlayer,
    PLACEHOLDER_TIME_TEXT,
};
use voicebubble_transport_http::{AssetResolver, ResolveHandle};

#[derive(Default)]
struct CellState {
    url: Option<String>,
    asset: Option<MediaAsset>,
    /// Last position this cell observed or chose
    position: Duration,
    /// Bumped on every URL assignment; completions for older values are dropped
    generation: u64,
    /// Whether the current generation's resolution has completed
    settled: bool,
    resolving: Option<ResolveHandle>,
}

pub struct CellController {
    me: Weak<CellController>,
    view: Arc<dyn BubbleView>,
    resolver: Arc<AssetResolver>,
    player: Mutex<Option<Arc<SharedPlayer>>>,
    state: Mutex<CellState>,
}

impl CellController {
    pub fn new(view: Arc<dyn BubbleView>, resolver: Arc<AssetResolver>) -> Arc<Self> {
        view.show_affordance(Affordance::Play);
        view.set_slider(0.0);
        view.set_time_text(PLACEHOLDER_TIME_TEXT);
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            view,
            resolver,
            player: Mutex::new(None),
            state: Mutex::new(CellState::default()),
        })
    }

    pub fn attach_player(&self, player: Arc<SharedPlayer>) {
        *self.player.lock() = Some(player);
    }

    /// Bind this cell to a message: the shared player and the message's audio URL
    pub fn configure(&self, player: Arc<SharedPlayer>, url: Option<&str>) {
        self.attach_player(player);
        self.on_asset_url_assigned(url);
    }

    pub fn url(&self) -> Option<String> {
        self.state.lock().url.clone()
    }

    /// Locally resolved asset, once available
    pub fn asset(&self) -> Option<MediaAsset> {
        self.state.lock().asset.clone()
    }

    /// Cached playback position
    pub fn position(&self) -> Duration {
        self.state.lock().position
    }

    pub fn is_resolving(&self) -> bool {
        self.state.lock().resolving.is_some()
    }

    /// Whether this cell currently receives player events
    pub fn is_active(&self) -> bool {
        match (self.player(), self.as_delegate()) {
            (Some(player), Some(me)) => player.is_delegate(&me),
            _ => false,
        }
    }

    fn player(&self) -> Option<Arc<SharedPlayer>> {
        self.player.lock().clone()
    }

    fn as_delegate(&self) -> Option<Arc<dyn PlayerDelegate>> {
        self.me.upgrade().map(|me| me as Arc<dyn PlayerDelegate>)
    }

    /// Bind the cell to a new message URL.
    ///
    /// Abandons any earlier resolution and gives up the delegate role, so events for the
    /// previous message never reach the rebound cell. Playback is left running.
    pub fn on_asset_url_assigned(&self, url: Option<&str>) {
        let (generation, previous) = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.url = url.map(str::to_string);
            state.asset = None;
            state.position = Duration::ZERO;
            state.settled = url.is_none();
            (state.generation, state.resolving.take())
        };
        if let Some(previous) = previous {
            log::debug!("Cancelling stale resolution (generation {})", generation - 1);
            previous.cancel();
        }
        self.view.set_slider(0.0);
        self.view.set_time_text(PLACEHOLDER_TIME_TEXT);
        if let (Some(player), Some(me)) = (self.player(), self.as_delegate()) {
            if player.release(&me) {
                log::debug!("Released player before binding a new message");
            }
        }

        let Some(url) = url else {
            return;
        };

        let me = self.me.clone();
        let handle = self.resolver.resolve(url, move |asset| {
            if let Some(cell) = me.upgrade() {
                cell.finish_resolution(generation, asset);
            }
        });

        let mut state = self.state.lock();
        // Cache hits and hopeless URLs have already completed
        if state.generation == generation && !state.settled {
            state.resolving = Some(handle);
        }
    }

    fn finish_resolution(&self, generation: u64, asset: Option<MediaAsset>) {
        let mut state = self.state.lock();
        if state.generation != generation {
            log::debug!("Ignoring resolution for generation {}", generation);
            return;
        }
        if asset.is_none() {
            log::debug!("No local audio for {:?}; taps will be ignored", state.url);
        }
        state.asset = asset;
        state.position = Duration::ZERO;
        state.settled = true;
        state.resolving = None;
    }

    /// Toggle playback of this cell's message, claiming the shared player first
    pub fn on_tap(&self) {
        let Some(player) = self.player() else {
            log::debug!("Tap ignored: no player attached");
            return;
        };
        let (asset, position) = {
            let state = self.state.lock();
            (state.asset.clone(), state.position)
        };
        let Some(asset) = asset else {
            log::debug!("Tap ignored: audio not available");
            return;
        };
        let Some(me) = self.as_delegate() else {
            return;
        };

        player.claim(&me, Some(&asset));

        if player.state() == PlaybackState::Playing {
            player.pause();
        } else {
            player.seek(position);
            player.play();
        }
    }

    /// Reset visuals and stop receiving events before the cell is rebound.
    /// Playback is left running.
    pub fn on_reuse(&self) {
        self.view.set_slider(0.0);
        self.view.set_time_text(PLACEHOLDER_TIME_TEXT);
        if let (Some(player), Some(me)) = (self.player(), self.as_delegate()) {
            player.release(&me);
        }
    }

    /// The user dragged the slider to `value` in [0, 1]
    pub fn on_slider_changed(&self, value: f32) {
        let value = value.clamp(0.0, 1.0) as f64;

        if let (Some(player), Some(me)) = (self.player(), self.as_delegate()) {
            if player.is_delegate(&me) {
                if let Some(duration) = player.duration() {
                    player.seek(duration.mul_f64(value));
                    self.state.lock().position = player.position();
                }
                return;
            }
        }

        let mut state = self.state.lock();
        if let Some(duration) = state.asset.as_ref().and_then(MediaAsset::duration) {
            state.position = duration.mul_f64(value);
        }
    }
}

impl PlayerDelegate for CellController {
    fn on_event(&self, event: PlayerEvent) {
        match event {
            PlayerEvent::Progress {
                position,
                duration,
                remaining_text,
            } => {
                self.state.lock().position = position;
                self.view.set_slider(progress_fraction(position, duration));
                self.view.set_time_text(&remaining_text);
            }
            PlayerEvent::Finished => {
                self.state.lock().position = Duration::ZERO;
                self.view.set_slider(0.0);
            }
            PlayerEvent::Started { .. } => self.view.show_affordance(Affordance::Pause),
            PlayerEvent::StateChanged {
                new_state: PlaybackState::Reserved,
                ..
            } => self.view.show_affordance(Affordance::Pause),
            PlayerEvent::Stopped | PlayerEvent::AssetReplaced | PlayerEvent::Detached => {
                self.view.show_affordance(Affordance::Play)
            }
            PlayerEvent::StateChanged { .. } => {}
        }
    }
}
