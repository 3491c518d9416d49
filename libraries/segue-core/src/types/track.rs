/// Track domain type
use crate::types::GroupType;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Audio track in a collection
///
/// Identity is the absolute file path: two `Track` values with the same path
/// are the same track, whatever their metadata says. Tracks are owned by the
/// `TrackCollection` and shared as `Arc<Track>`; everything else refers to them.
///
/// Duration and decode-readiness are filled in lazily (usually by the
/// preparation worker), so those fields use interior mutability.
#[derive(Debug)]
pub struct Track {
    /// Absolute file path (identity)
    path: PathBuf,

    /// Tag metadata used for display and grouping
    metadata: TrackMetadata,

    /// Duration in seconds, set once when known
    duration: OnceLock<f64>,

    /// Whether decode-readiness info has been loaded
    prepared: AtomicBool,

    /// Cleared when preparation found the file unplayable
    valid: AtomicBool,
}

/// Track metadata extracted from file tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title
    pub title: Option<String>,

    /// Artist name
    pub artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Genre
    pub genre: Option<String>,

    /// Release year
    pub year: Option<u32>,

    /// Track number
    pub track_number: Option<u32>,

    /// Disc number
    pub disc_number: Option<u32>,
}

impl Track {
    /// Create a new track with no metadata
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_metadata(path, TrackMetadata::default())
    }

    /// Create a new track with tag metadata
    pub fn with_metadata(path: impl Into<PathBuf>, metadata: TrackMetadata) -> Self {
        Self {
            path: path.into(),
            metadata,
            duration: OnceLock::new(),
            prepared: AtomicBool::new(false),
            valid: AtomicBool::new(true),
        }
    }

    /// Builder-style duration (seconds)
    #[must_use]
    pub fn with_duration(self, seconds: f64) -> Self {
        self.set_duration(seconds);
        self
    }

    /// File path (identity)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tag metadata
    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    /// Name shown to the user: the title tag, or the file stem
    pub fn display_name(&self) -> String {
        if let Some(title) = self.metadata.title.as_deref().filter(|t| !t.is_empty()) {
            return match self.metadata.artist.as_deref().filter(|a| !a.is_empty()) {
                Some(artist) => format!("{artist} - {title}"),
                None => title.to_string(),
            };
        }

        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Duration in seconds, if it has been computed
    pub fn duration(&self) -> Option<f64> {
        self.duration.get().copied()
    }

    /// Duration in seconds, or 0 if unknown
    pub fn duration_or_zero(&self) -> f64 {
        self.duration().unwrap_or(0.0)
    }

    /// Record the duration
    ///
    /// Returns false if a duration was already recorded (the first value wins)
    /// or the value is not a finite, non-negative number.
    pub fn set_duration(&self, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            return false;
        }
        self.duration.set(seconds).is_ok()
    }

    /// Whether decode-readiness info has been loaded
    pub fn is_prepared(&self) -> bool {
        self.prepared.load(Ordering::Acquire)
    }

    /// Mark the track as ready for playback
    pub fn mark_prepared(&self) {
        self.valid.store(true, Ordering::Release);
        self.prepared.store(true, Ordering::Release);
    }

    /// Whether the file was playable the last time it was prepared
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Mark the track as unplayable
    pub fn mark_invalid(&self) {
        self.prepared.store(false, Ordering::Release);
        self.valid.store(false, Ordering::Release);
    }

    /// Name of the group this track belongs to for a grouping type
    pub fn group_name(&self, group_type: GroupType) -> String {
        let value = match group_type {
            GroupType::Artist => self.metadata.artist.clone(),
            GroupType::Album => self.metadata.album.clone(),
            GroupType::Genre => self.metadata.genre.clone(),
            GroupType::Decade => self.metadata.year.map(|year| format!("{}s", year / 10 * 10)),
        };

        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| group_type.unknown_name().to_string())
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}
