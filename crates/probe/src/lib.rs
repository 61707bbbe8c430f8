// Audio duration probing using Symphonia

use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to probe media: {0}")]
    Format(#[from] SymphoniaError),

    #[error("No default track found")]
    NoTrack,

    #[error("Track does not declare its length")]
    UnknownDuration,
}

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Track information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub duration: Duration,
}

/// Create a hint from file extension
fn hint_for(path: &Path) -> Hint {
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }
    hint
}

/// Read the default track's parameters from an audio file
pub fn probe_file(path: &Path) -> Result<TrackInfo> {
    let file = File::open(path)?;
    let media_source_stream = MediaSourceStream::new(Box::new(file), Default::default());

    let probe_result = symphonia::default::get_probe().format(
        &hint_for(path),
        media_source_stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let track = probe_result
        .format
        .default_track()
        .ok_or(ProbeError::NoTrack)?;
    let codec_params = &track.codec_params;
    let n_frames = codec_params.n_frames.ok_or(ProbeError::UnknownDuration)?;

    let duration_ms = match (codec_params.time_base, codec_params.sample_rate) {
        (Some(tb), _) if tb.denom > 0 => (n_frames * 1000 * tb.numer as u64) / tb.denom as u64,
        (_, Some(sample_rate)) if sample_rate > 0 => (n_frames * 1000) / sample_rate as u64,
        _ => return Err(ProbeError::UnknownDuration),
    };

    let info = TrackInfo {
        sample_rate: codec_params.sample_rate,
        channels: codec_params.channels.map(|c| c.count() as u16),
        duration: Duration::from_millis(duration_ms),
    };
    log::debug!("Probed {}: {:?}", path.display(), info);
    Ok(info)
}

/// Duration of the audio in `path`
pub fn probe_duration(path: &Path) -> Result<Duration> {
    probe_file(path).map(|info| info.duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn wav_bytes(sample_rate: u32, seconds: u32) -> Vec<u8> {
        let data_len = sample_rate * seconds * 2;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(44 + data_len as usize, 0);
        out
    }

    #[test]
    fn test_probe_wav_duration() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(&wav_bytes(8000, 2)).unwrap();

        let info = probe_file(file.path()).unwrap();
        assert_eq!(info.duration, Duration::from_secs(2));
        assert_eq!(info.sample_rate, Some(8000));
        assert_eq!(info.channels, Some(1));
    }

    #[test]
    fn test_probe_ignores_misleading_extension() {
        let mut file = tempfile::Builder::new().suffix(".m4a").tempfile().unwrap();
        file.write_all(&wav_bytes(1000, 3)).unwrap();

        assert_eq!(probe_duration(file.path()).unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_probe_rejects_non_audio() {
        let mut file = tempfile::Builder::new().suffix(".m4a").tempfile().unwrap();
        file.write_all(b"<html>not audio</html>").unwrap();

        assert!(probe_duration(file.path()).is_err());
    }

    #[test]
    fn test_probe_missing_file() {
        let err = probe_duration(Path::new("/nonexistent/fileid42.m4a")).unwrap_err();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
