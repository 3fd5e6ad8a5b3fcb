//! Error types for playback control

use std::path::PathBuf;
use thiserror::Error;

/// A track could not be made ready for playback
///
/// Cloneable so a prep cache can hand the same failure to every caller
/// waiting on the track, and so it can travel inside notifications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreparationError {
    /// The file could not be opened or read
    #[error("Cannot read {path:?}: {reason}")]
    Unreadable {
        /// Path of the track that failed
        path: PathBuf,
        /// Underlying I/O failure
        reason: String,
    },

    /// The container or codec is not supported
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Metadata or decoder setup failed
    #[error("Decoder setup failed: {0}")]
    Decode(String),
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The selected track could not be prepared
    #[error("Preparation failed: {0}")]
    Preparation(#[from] PreparationError),

    /// No track resolves at the requested index
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
