// HTTP transport: content-addressed cache of message audio

pub mod cache;
pub mod client;
pub mod download;
pub mod error;
pub mod resolver;

pub use cache::{file_id, AssetCache, DEFAULT_EXTENSION, FILE_ID_PARAM};
pub use client::{create_http_agent, HttpConfig};
pub use download::download_to_cache;
pub use error::{ResolveError, Result};
pub use resolver::{AssetResolver, ResolveHandle};
