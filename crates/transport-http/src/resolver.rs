// Resolution of message URLs to cached local assets
//
// Downloads run on a background thread. Their completion is posted to the main
// queue so that callers only ever observe results on the run loop thread.

use crate::cache::AssetCache;
use crate::client::{create_http_agent, HttpConfig};
use crate::download::download_to_cache;
use crate::error::{ResolveError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use voicebubble_core::{MainQueue, MediaAsset};

/// Cancels an in-flight resolution. Completions of a cancelled resolution are never delivered.
#[derive(Debug, Clone, Default)]
pub struct ResolveHandle {
    cancelled: Arc<AtomicBool>,
}

impl ResolveHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

pub struct AssetResolver {
    cache: AssetCache,
    config: HttpConfig,
    agent: ureq::Agent,
    queue: MainQueue,
}

impl AssetResolver {
    pub fn new(cache: AssetCache, config: HttpConfig, queue: MainQueue) -> Self {
        log::info!("Asset cache at {}", cache.dir().display());
        Self {
            agent: create_http_agent(&config),
            cache,
            config,
            queue,
        }
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Resolve `url` to a local asset and hand the outcome to `on_done`.
    ///
    /// A cached file, or a URL that can never be cached, completes immediately on the
    /// calling thread. Anything else is downloaded in the background and `on_done`
    /// runs from the main queue. Failures resolve to `None`.
    pub fn resolve<F>(&self, url: &str, on_done: F) -> ResolveHandle
    where
        F: FnOnce(Option<MediaAsset>) + Send + 'static,
    {
        let handle = ResolveHandle::default();

        let dest = match self.cache.path_for(url) {
            Ok(dest) => dest,
            Err(e) => {
                log::warn!("Cannot resolve {}: {}", url, e);
                on_done(None);
                return handle;
            }
        };
        if dest.is_file() {
            log::debug!("Cache hit for {}: {}", url, dest.display());
            on_done(Some(asset_at(dest, url)));
            return handle;
        }

        let agent = self.agent.clone();
        let retries = self.config.retries;
        let queue = self.queue.clone();
        let cancelled = handle.cancelled.clone();
        let url = url.to_string();

        thread::spawn(move || {
            let asset = match download_to_cache(&agent, &url, &dest, retries, &cancelled) {
                Ok(_) => Some(asset_at(dest, &url)),
                Err(ResolveError::Cancelled) => None,
                Err(e) => {
                    log::warn!("Failed to resolve {}: {}", url, e);
                    None
                }
            };
            queue.post(move || {
                if cancelled.load(Ordering::Relaxed) {
                    log::debug!("Dropping result of cancelled resolution for {}", url);
                    return;
                }
                on_done(asset);
            });
        });

        handle
    }

    /// Resolve `url` on the calling thread
    pub fn resolve_blocking(&self, url: &str) -> Result<MediaAsset> {
        let dest = self.cache.path_for(url)?;
        if !dest.is_file() {
            download_to_cache(&self.agent, url, &dest, self.config.retries, &AtomicBool::new(false))?;
        }
        Ok(asset_at(dest, url))
    }
}

fn asset_at(path: PathBuf, url: &str) -> MediaAsset {
    let duration = match voicebubble_probe::probe_duration(&path) {
        Ok(duration) => Some(duration),
        Err(e) => {
            log::warn!("Could not read duration of {}: {}", path.display(), e);
            None
        }
    };
    MediaAsset::new(path)
        .with_source_url(url)
        .with_duration(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::tests::serve_once;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    type Slot = Arc<Mutex<Option<Option<MediaAsset>>>>;

    fn recording_slot() -> (Slot, impl FnOnce(Option<MediaAsset>) + Send + 'static) {
        let slot: Slot = Arc::new(Mutex::new(None));
        let writer = slot.clone();
        (slot, move |asset: Option<MediaAsset>| *writer.lock() = Some(asset))
    }

    fn resolver(dir: &std::path::Path, queue: &MainQueue) -> AssetResolver {
        let config = HttpConfig {
            retries: 0,
            ..HttpConfig::default()
        };
        AssetResolver::new(AssetCache::new(dir), config, queue.clone())
    }

    /// Drain the queue until `slot` is filled or `timeout` passes
    fn wait_for(queue: &MainQueue, slot: &Slot, timeout: Duration) -> Option<Option<MediaAsset>> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            queue.drain();
            if let Some(result) = slot.lock().clone() {
                return Some(result);
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[test]
    fn test_missing_file_id_fails_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let queue = MainQueue::new();
        let (slot, on_done) = recording_slot();

        resolver(dir.path(), &queue).resolve("https://h/audio.m4a", on_done);

        assert_eq!(*slot.lock(), Some(None));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cache_hit_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let cached = dir.path().join("fileid77.m4a");
        std::fs::write(&cached, b"cached").unwrap();
        let queue = MainQueue::new();
        let (slot, on_done) = recording_slot();

        // Unroutable host: any network attempt would fail
        resolver(dir.path(), &queue).resolve("http://invalid.invalid/m?fileid=77", on_done);

        let asset = slot.lock().clone().expect("completed synchronously").expect("resolved");
        assert_eq!(asset.path(), cached.as_path());
        assert_eq!(asset.source_url(), Some("http://invalid.invalid/m?fileid=77"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_download_completes_on_main_queue() {
        let dir = tempfile::tempdir().unwrap();
        let queue = MainQueue::new();
        let (slot, on_done) = recording_slot();
        let url = serve_once("200 OK", "audio/mp4", b"payload");

        resolver(dir.path(), &queue).resolve(&url, on_done);
        assert!(slot.lock().is_none());

        let asset = wait_for(&queue, &slot, Duration::from_secs(5))
            .expect("completion posted")
            .expect("resolved");
        assert_eq!(asset.path(), dir.path().join("fileidtest.m4a").as_path());
        // Not decodable audio, so the duration stays unknown
        assert_eq!(asset.duration(), None);
    }

    #[test]
    fn test_failed_download_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let queue = MainQueue::new();
        let (slot, on_done) = recording_slot();
        let url = serve_once("500 Internal Server Error", "text/plain", b"boom");

        resolver(dir.path(), &queue).resolve(&url, on_done);

        assert_eq!(wait_for(&queue, &slot, Duration::from_secs(5)), Some(None));
    }

    #[test]
    fn test_cancelled_resolution_never_completes() {
        let dir = tempfile::tempdir().unwrap();
        let queue = MainQueue::new();
        let (slot, on_done) = recording_slot();
        let url = serve_once("200 OK", "audio/mp4", b"payload");

        let handle = resolver(dir.path(), &queue).resolve(&url, on_done);
        handle.cancel();

        assert_eq!(wait_for(&queue, &slot, Duration::from_millis(500)), None);
    }

    #[test]
    fn test_resolve_blocking_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fileid3.m4a"), b"x").unwrap();
        let queue = MainQueue::new();

        let asset = resolver(dir.path(), &queue)
            .resolve_blocking("http://invalid.invalid/m?fileid=3")
            .unwrap();
        assert_eq!(asset.path(), dir.path().join("fileid3.m4a").as_path());

        let err = resolver(dir.path(), &queue)
            .resolve_blocking("http://invalid.invalid/m")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingFileId(_)));
    }
}
