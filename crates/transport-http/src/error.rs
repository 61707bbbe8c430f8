// Asset resolution errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("URL has no fileid query parameter: {0}")]
    MissingFileId(String),

    #[error("Unusable fileid value: {0:?}")]
    InvalidFileId(String),

    #[error("Unsupported URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Not an audio response: {0}")]
    NotAudio(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download cancelled")]
    Cancelled,
}

/// Result type alias for asset resolution
pub type Result<T> = std::result::Result<T, ResolveError>;
