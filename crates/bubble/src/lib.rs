// Voice message bubble: cell controllers over one shared player

pub mod cell;
pub mod kit;
pub mod view;

use std::sync::Once;

pub use cell::CellController;
pub use kit::{BubbleConfig, BubbleKit};
pub use view::{Affordance, BubbleSnapshot, BubbleView, BubbleViewModel};

pub use voicebubble_core;
pub use voicebubble_transport_http;

static INIT_LOGGER: Once = Once::new();

/// Install `env_logger` once. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    });
}
