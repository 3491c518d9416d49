/// Core error types for Segue
use crate::types::GroupKey;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by track collection operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Index does not address a track (or group) in the collection
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// A track with the same file path is already in the collection
    #[error("Duplicate track: {}", .0.display())]
    DuplicateTrack(PathBuf),

    /// No track with this file path exists in the collection
    #[error("Track not found: {}", .0.display())]
    TrackNotFound(PathBuf),

    /// The group no longer exists in its grouping
    #[error("Group not found: {0}")]
    GroupNotFound(GroupKey),

    /// Operation not valid in the current shape of the collection
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl CoreError {
    /// Create an invalid operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }
}
