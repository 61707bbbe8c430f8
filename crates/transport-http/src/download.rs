// Download of a single asset into the cache

use crate::client::{ensure_http_url, get_with_retries};
use crate::error::{ResolveError, Result};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Read buffer size (64KB)
const CHUNK_SIZE: usize = 64 * 1024;

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fetch `url` into `dest`.
///
/// The response must be `200 OK` with an `audio/*` content type. The body is written
/// to a sibling temporary file and renamed over `dest` once complete, so readers never
/// see a partial asset. `cancel` is checked between chunks.
/// Returns the number of bytes written.
pub fn download_to_cache(
    agent: &ureq::Agent,
    url: &str,
    dest: &Path,
    max_retries: u32,
    cancel: &AtomicBool,
) -> Result<u64> {
    ensure_http_url(url)?;
    log::info!("Starting download from: {}", url);

    let response = get_with_retries(agent, url, max_retries)?;
    if response.status() != 200 {
        return Err(ResolveError::HttpStatus(response.status()));
    }
    let content_type = response.content_type().to_string();
    if !content_type.starts_with("audio") {
        return Err(ResolveError::NotAudio(content_type));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let part = part_path(dest);
    let result = write_body(response.into_reader(), &part, cancel)
        .and_then(|written| fs::rename(&part, dest).map(|_| written).map_err(ResolveError::from));

    match result {
        Ok(written) => {
            log::info!("Download complete: {} bytes -> {}", written, dest.display());
            Ok(written)
        }
        Err(e) => {
            // Best effort: the partial file is useless either way
            let _ = fs::remove_file(&part);
            Err(e)
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let seq = PART_COUNTER.fetch_add(1, Ordering::Relaxed);
    dest.with_file_name(format!(".{}.{}-{}.part", name, std::process::id(), seq))
}

fn write_body(mut reader: impl Read, path: &Path, cancel: &AtomicBool) -> Result<u64> {
    let mut file = File::create(path)?;
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        if cancel.load(Ordering::Relaxed) {
            log::debug!("Download cancelled after {} bytes", total);
            return Err(ResolveError::Cancelled);
        }
        let read = reader
            .read(&mut buffer)
            .map_err(|e| ResolveError::Network(format!("Download failed: {}", e)))?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])?;
        total += read as u64;
    }

    file.flush()?;
    Ok(total)
}
