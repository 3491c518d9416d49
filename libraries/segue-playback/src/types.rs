//! Core types for playback management

use crate::scope::SequenceScope;
use segue_core::Track;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Player state machine
///
/// ```text
/// NoTrack --play--> Playing <--pause/resume--> Paused
/// Playing|Paused --stop--> NoTrack
/// NoTrack --wait--> Waiting --transcoding--> Transcoding
/// Waiting|Transcoding --play--> Playing
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No track loaded
    NoTrack,

    /// A track is being prepared before it can start
    Waiting,

    /// A track is being transcoded before it can start
    Transcoding,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

impl PlaybackState {
    /// Whether a track is loaded (playing or paused)
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop when the sequence ends
    #[default]
    Off,

    /// Loop current track only
    One,

    /// Loop the whole sequence
    All,
}

impl RepeatMode {
    /// Next mode in the toggle cycle Off -> One -> All -> Off
    pub fn toggled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }
}

/// Shuffle mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShuffleMode {
    /// Play in scope order
    #[default]
    Off,

    /// Play a random permutation of the scope
    On,
}

impl ShuffleMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            ShuffleMode::Off => ShuffleMode::On,
            ShuffleMode::On => ShuffleMode::Off,
        }
    }
}

/// Sequence position shown by the UI ("3 / 12 in Artist: Nina")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceInfo {
    /// Scope the sequence runs over
    pub scope: SequenceScope,

    /// 1-based position of the current track (0 if none)
    pub track_index: usize,

    /// Number of tracks in the scope
    pub total_tracks: usize,
}

/// Result of a play/pause toggle, enough for the UI to refresh
#[derive(Debug, Clone)]
pub struct PlaybackTransition {
    /// State after the toggle
    pub state: PlaybackState,

    /// Track that started, if the toggle started a new one
    pub track: Option<Arc<Track>>,
}

/// Seek position of the playing track
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeekPosition {
    /// Elapsed seconds
    pub time: f64,

    /// Track duration in seconds
    pub duration: f64,

    /// Elapsed share of the track, 0-100
    pub percentage: f64,
}

impl SeekPosition {
    /// Build a position, deriving the percentage
    pub fn new(time: f64, duration: f64) -> Self {
        let percentage = if duration > 0.0 {
            (time / duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            time,
            duration,
            percentage,
        }
    }
}
