//! Playback Events
//!
//! Two directions of event traffic:
//! - [`PlaybackEvent`]s are queued by the delegate for the UI to drain
//!   after each call (state, track, loop and mode changes)
//! - [`RenderNotification`]s flow from render/hardware threads into the
//!   control thread's inbox through a [`RenderNotifier`]

use crate::error::InvalidTrackError;
use crate::session::{PlaybackLoop, SessionId};
use crate::types::{PlaybackState, RepeatMode, ShuffleMode};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events emitted by the playback delegate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Player state changed
    StateChanged {
        /// The new state
        state: PlaybackState,
    },

    /// A different track started (or playback ended)
    TrackChanged {
        /// Track that was playing
        previous: Option<PathBuf>,
        /// Track now playing
        current: Option<PathBuf>,
    },

    /// Auto-advance picked a track that failed preparation
    TrackNotPlayed {
        /// What went wrong, including the file
        error: InvalidTrackError,
    },

    /// The sequence ran out of tracks
    SequenceEnded,

    /// Segment loop defined, marked or removed
    LoopChanged {
        /// Loop in effect now
        playback_loop: Option<PlaybackLoop>,
    },

    /// Repeat or shuffle mode changed
    ModesChanged {
        /// Repeat mode
        repeat: RepeatMode,
        /// Shuffle mode
        shuffle: ShuffleMode,
    },

    /// Playing track was sought
    Seeked {
        /// New position in seconds
        position: f64,
    },

    /// The audio engine could not be restarted after a device change
    RenderFailed {
        /// Renderer's error message
        message: String,
    },

    /// Collection contents or order changed
    PlaylistChanged {
        /// Number of tracks afterwards
        size: usize,
    },
}

/// Message from a render or hardware thread to the control thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderNotification {
    /// A track scheduled under `session_id` played to its end
    PlaybackCompleted {
        /// Session the finished audio was scheduled under
        session_id: SessionId,
    },

    /// The audio output device changed
    OutputDeviceChanged,
}

/// Sending half of the control-thread inbox
///
/// Handed to the render layer; safe to clone and use from any thread.
#[derive(Debug, Clone)]
pub struct RenderNotifier {
    sender: Sender<RenderNotification>,
}

impl RenderNotifier {
    pub(crate) fn new(sender: Sender<RenderNotification>) -> Self {
        Self { sender }
    }

    /// Report natural completion of a track
    pub fn playback_completed(&self, session_id: SessionId) {
        self.send(RenderNotification::PlaybackCompleted { session_id });
    }

    /// Report an output device change
    pub fn output_device_changed(&self) {
        self.send(RenderNotification::OutputDeviceChanged);
    }

    fn send(&self, notification: RenderNotification) {
        // The delegate has been dropped; nobody is left to act on it
        if self.sender.send(notification).is_err() {
            tracing::debug!("Dropping {:?}, control thread is gone", notification);
        }
    }
}
