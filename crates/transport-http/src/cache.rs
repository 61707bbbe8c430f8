// Content-addressed cache of downloaded message audio
//
// A message URL maps to `<dir>/fileid<id>.<ext>` where `<id>` is the value of its
// `fileid` query parameter, so a file that already exists never needs fetching again.

use crate::error::{ResolveError, Result};
use std::path::{Path, PathBuf};

/// Query parameter naming the cached file
pub const FILE_ID_PARAM: &str = "fileid";

/// Extension of every cached file
pub const DEFAULT_EXTENSION: &str = "m4a";

#[derive(Debug, Clone)]
pub struct AssetCache {
    dir: PathBuf,
    extension: String,
}

impl AssetCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Cache in the user's documents directory, falling back to the temp dir
    pub fn in_documents() -> Self {
        let dir = dirs::document_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(dir)
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination file for `url`
    pub fn path_for(&self, url: &str) -> Result<PathBuf> {
        let id = file_id(url)?;
        Ok(self
            .dir
            .join(format!("{}{}.{}", FILE_ID_PARAM, id, self.extension)))
    }

    /// Cached file for `url`, if it is already on disk
    pub fn lookup(&self, url: &str) -> Option<PathBuf> {
        self.path_for(url).ok().filter(|path| path.is_file())
    }
}

/// Value of the last `fileid` query parameter that carries one.
/// Values that could escape the cache directory are rejected.
pub fn file_id(url: &str) -> Result<String> {
    let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
    let query = without_fragment
        .split_once('?')
        .map(|(_, query)| query)
        .ok_or_else(|| ResolveError::MissingFileId(url.to_string()))?;

    let mut found = None;
    for pair in query.split('&') {
        // A parameter without '=' carries no value
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = urlencoding::decode(name).map_err(|_| ResolveError::InvalidUrl(url.to_string()))?;
        if name == FILE_ID_PARAM {
            let value = urlencoding::decode(value).map_err(|_| ResolveError::InvalidUrl(url.to_string()))?;
            found = Some(value.into_owned());
        }
    }

    let id = found.ok_or_else(|| ResolveError::MissingFileId(url.to_string()))?;
    if id.is_empty() || id.contains("..") || id.contains(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(ResolveError::InvalidFileId(id));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_from_query() {
        assert_eq!(
            file_id("https://chat.example.com/media?fileid=abc123&sig=x").unwrap(),
            "abc123"
        );
        assert_eq!(file_id("https://h/m?a=1&fileid=7#frag").unwrap(), "7");
    }

    #[test]
    fn test_file_id_last_value_wins_and_is_decoded() {
        assert_eq!(file_id("https://h/m?fileid=1&fileid=voice%20note").unwrap(), "voice note");
        assert_eq!(file_id("https://h/m?fileid=9&fileid").unwrap(), "9");
    }

    #[test]
    fn test_missing_file_id() {
        assert!(matches!(
            file_id("https://h/audio.m4a"),
            Err(ResolveError::MissingFileId(_))
        ));
        assert!(matches!(
            file_id("https://h/m?id=3#fileid=4"),
            Err(ResolveError::MissingFileId(_))
        ));
    }

    #[test]
    fn test_path_like_file_id_rejected() {
        assert!(matches!(
            file_id("https://h/m?fileid=..%2Fetc"),
            Err(ResolveError::InvalidFileId(_))
        ));
        assert!(matches!(
            file_id("https://h/m?fileid="),
            Err(ResolveError::InvalidFileId(_))
        ));
    }

    #[test]
    fn test_path_for_is_deterministic() {
        let cache = AssetCache::new("/data/cache");
        assert_eq!(
            cache.path_for("https://h/m?fileid=42").unwrap(),
            PathBuf::from("/data/cache/fileid42.m4a")
        );
        let ogg = AssetCache::new("/data/cache").with_extension("ogg");
        assert_eq!(
            ogg.path_for("https://other/x?fileid=42").unwrap(),
            PathBuf::from("/data/cache/fileid42.ogg")
        );
    }

    #[test]
    fn test_lookup_only_finds_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AssetCache::new(dir.path());
        let url = "https://h/m?fileid=5";
        assert!(cache.lookup(url).is_none());

        std::fs::write(dir.path().join("fileid5.m4a"), b"x").unwrap();
        assert_eq!(cache.lookup(url), Some(dir.path().join("fileid5.m4a")));
    }
}
