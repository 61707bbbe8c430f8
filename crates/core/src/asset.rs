// Playable audio backed by a local file

use std::path::{Path, PathBuf};
use std::time::Duration;

/// A resolved audio asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    path: PathBuf,
    source_url: Option<String>,
    duration: Option<Duration>,
}

impl MediaAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source_url: None,
            duration: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    /// Local file the asset plays from
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}
