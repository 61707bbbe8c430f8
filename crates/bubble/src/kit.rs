// Wiring of one shared player, one resolver and the run loop they share

use crate::cell::CellController;
use crate::view::BubbleView;
use std::sync::Arc;
use voicebubble_core::{
    ClockEngine, ManualClock, MediaEngine, PlayerConfig, RunLoop, SharedPlayer, StopRequest,
};
use voicebubble_transport_http::{AssetCache, AssetResolver, HttpConfig};

#[derive(Debug, Clone)]
pub struct BubbleConfig {
    pub player: PlayerConfig,
    pub cache: AssetCache,
    pub http: HttpConfig,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            cache: AssetCache::in_documents(),
            http: HttpConfig::default(),
        }
    }
}

/// Everything a chat screen needs to play voice messages.
///
/// All cells created from one kit share its player, so at most one message plays.
pub struct BubbleKit {
    run_loop: RunLoop,
    player: Arc<SharedPlayer>,
    resolver: Arc<AssetResolver>,
}

impl BubbleKit {
    /// Kit on the wall clock with the software transport
    pub fn new(config: BubbleConfig) -> Self {
        let run_loop = RunLoop::system();
        let engine = ClockEngine::new(run_loop.clock().clone());
        Self::with_engine(config, run_loop, Box::new(engine))
    }

    /// Kit on a manual clock, returned alongside for `RunLoop::advance`
    pub fn simulated(config: BubbleConfig) -> (Self, Arc<ManualClock>) {
        let (run_loop, clock) = RunLoop::simulated();
        let engine = ClockEngine::new(clock.clone());
        (Self::with_engine(config, run_loop, Box::new(engine)), clock)
    }

    /// Kit driving a host-provided engine. The engine must run on `run_loop`'s clock.
    pub fn with_engine(config: BubbleConfig, run_loop: RunLoop, engine: Box<dyn MediaEngine>) -> Self {
        crate::init_logging();
        let player = SharedPlayer::new(engine, run_loop.scheduler().clone(), config.player);
        let resolver = Arc::new(AssetResolver::new(
            config.cache,
            config.http,
            run_loop.queue().clone(),
        ));
        Self {
            run_loop,
            player,
            resolver,
        }
    }

    pub fn run_loop(&self) -> &RunLoop {
        &self.run_loop
    }

    pub fn player(&self) -> &Arc<SharedPlayer> {
        &self.player
    }

    pub fn resolver(&self) -> &Arc<AssetResolver> {
        &self.resolver
    }

    /// Handle for pausing whatever is playing, from anywhere in the app
    pub fn stop_request(&self) -> StopRequest {
        self.player.stop_request(self.run_loop.queue())
    }

    /// Controller for a new bubble, already attached to the shared player
    pub fn new_cell(&self, view: Arc<dyn BubbleView>) -> Arc<CellController> {
        let cell = CellController::new(view, self.resolver.clone());
        cell.attach_player(self.player.clone());
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::BubbleViewModel;
    use voicebubble_core::PlaybackState;

    #[test]
    fn test_cells_share_one_player() {
        let dir = tempfile::tempdir().unwrap();
        let config = BubbleConfig {
            cache: AssetCache::new(dir.path()),
            ..BubbleConfig::default()
        };
        let (kit, _clock) = BubbleKit::simulated(config);

        let a = kit.new_cell(Arc::new(BubbleViewModel::new()));
        let b = kit.new_cell(Arc::new(BubbleViewModel::new()));
        assert!(!a.is_active());
        assert!(!b.is_active());
        assert!(!kit.player().has_delegate());
        assert_eq!(kit.player().state(), PlaybackState::Unknown);
        assert_eq!(kit.resolver().cache().dir(), dir.path());
    }

    #[test]
    fn test_wall_clock_kit_starts_idle() {
        let dir = tempfile::tempdir().unwrap();
        let kit = BubbleKit::new(BubbleConfig {
            cache: AssetCache::new(dir.path()),
            ..BubbleConfig::default()
        });

        let cell = kit.new_cell(Arc::new(BubbleViewModel::new()));
        cell.on_asset_url_assigned(Some("https://chat.example.com/voice/1.m4a"));
        cell.on_tap();

        assert_eq!(kit.run_loop().turn(), 0);
        assert!(!kit.player().has_asset());
        assert!(!kit.player().is_polling());
    }

    #[test]
    fn test_default_config_intervals() {
        let config = BubbleConfig::default();
        assert_eq!(config.player.poll_interval.as_millis(), 250);
        assert_eq!(config.http.retries, 2);
    }
}
