//! Error types for playback management

use segue_core::{CoreError, GroupKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a track could not be prepared for playback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidTrackKind {
    /// The file has no audio streams
    NoAudioTracks,

    /// The file has audio but cannot be played
    NotPlayable,

    /// The container or codec is not supported
    UnsupportedFormat(String),

    /// The file does not exist
    FileNotFound,
}

impl fmt::Display for InvalidTrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidTrackKind::NoAudioTracks => f.write_str("no audio tracks"),
            InvalidTrackKind::NotPlayable => f.write_str("not playable"),
            InvalidTrackKind::UnsupportedFormat(format) => {
                write!(f, "unsupported format ({format})")
            }
            InvalidTrackKind::FileNotFound => f.write_str("file not found"),
        }
    }
}

/// A specific track failed preparation
///
/// Carries the offending file path so the UI can offer to remove it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Track {} is invalid: {kind}", .path.display())]
pub struct InvalidTrackError {
    /// File that failed
    pub path: PathBuf,

    /// Failure kind
    pub kind: InvalidTrackKind,
}

impl InvalidTrackError {
    /// Create an error for a file
    pub fn new(path: impl Into<PathBuf>, kind: InvalidTrackKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Track preparation failed
    #[error(transparent)]
    InvalidTrack(#[from] InvalidTrackError),

    /// Operation needs a playing (or paused) track
    #[error("No track playing")]
    NoTrackPlaying,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Track is not part of the collection
    #[error("Track not found: {}", .0.display())]
    TrackNotFound(PathBuf),

    /// Group is not part of the collection
    #[error("Group not found: {0}")]
    GroupNotFound(GroupKey),

    /// Collection mutation failed
    #[error("Collection error: {0}")]
    Collection(#[from] CoreError),

    /// Operation not valid in the current player state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Audio render layer error
    #[error("Render error: {0}")]
    Render(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlaybackError {
    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    /// Create a render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
