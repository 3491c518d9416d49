//! Segue - Playback Sequencing
//!
//! Platform-agnostic playback sequencing and session management for Segue.
//!
//! This crate provides:
//! - Next/previous/auto-advance decisions over repeat (Off, One, All) and
//!   shuffle (Off, On) modes, with bounded shuffle history
//! - Sequence scopes: all tracks, all groups of a type, or one group, with
//!   absolute ↔ grouped index mapping
//! - Cursor recovery when the collection is mutated underneath playback
//! - Playback sessions whose identity invalidates stale render callbacks
//! - A→B segment loops with seek correction
//! - Background preparation of likely-next tracks on a serial worker
//!
//! # Architecture
//!
//! `segue-playback` never touches audio hardware or decoders. The platform
//! supplies them through traits:
//! - [`AudioRenderer`]: session-scoped scheduling, pause/resume/stop, seek
//! - [`TrackPreparer`]: loads decode-readiness info (may be slow)
//!
//! All state lives in a [`PlaybackDelegate`] owned by one control thread.
//! Render threads report back through a [`RenderNotifier`]; the control
//! thread handles those reports in [`PlaybackDelegate::process_notifications`].
//!
//! # Example
//!
//! ```rust
//! use segue_core::Track;
//! use segue_playback::{
//!     AudioRenderer, InvalidTrackError, PlaybackConfig, PlaybackDelegate, PlaybackSession,
//!     PlaybackState, RepeatMode, Result, TrackPreparer,
//! };
//! use std::sync::Arc;
//!
//! struct SilentRenderer;
//!
//! impl AudioRenderer for SilentRenderer {
//!     fn schedule_track(&mut self, _session: &PlaybackSession, _start_time: f64) {}
//!     fn schedule_loop(&mut self, _session: &PlaybackSession, _start: f64, _playing: bool) {}
//!     fn seek(&mut self, _session: &PlaybackSession, _time: f64, _playing: bool) {}
//!     fn pause(&mut self) {}
//!     fn resume(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn seek_position(&self) -> f64 {
//!         0.0
//!     }
//!     fn restart_engine(&mut self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! struct AlwaysReady;
//!
//! impl TrackPreparer for AlwaysReady {
//!     fn prepare(&self, track: &Track) -> std::result::Result<(), InvalidTrackError> {
//!         track.set_duration(180.0);
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut delegate = PlaybackDelegate::new(
//!     Box::new(SilentRenderer),
//!     Arc::new(AlwaysReady),
//!     PlaybackConfig::default(),
//! )?;
//!
//! delegate.add_tracks(vec![Track::new("/music/a.flac"), Track::new("/music/b.flac")]);
//! delegate.set_repeat_mode(RepeatMode::All);
//!
//! let transition = delegate.toggle_play_pause()?;
//! assert_eq!(transition.state, PlaybackState::Playing);
//! assert_eq!(delegate.sequence_info().track_index, 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod delegate;
mod error;
pub mod events;
mod history;
mod player;
mod prefetch;
mod render;
pub mod scope;
mod sequence;
mod sequencer;
pub mod session;
mod shuffle;
pub mod types;

// Public exports
pub use config::{JsonSettingsStore, ModeSettings, PlaybackConfig, SettingsStore};
pub use delegate::PlaybackDelegate;
pub use error::{InvalidTrackError, InvalidTrackKind, PlaybackError, Result};
pub use events::{PlaybackEvent, RenderNotification, RenderNotifier};
pub use history::History;
pub use player::Player;
pub use prefetch::PrepQueue;
pub use render::{AudioRenderer, TrackPreparer};
pub use scope::{to_absolute, to_grouped, GroupedIndex, SequenceScope};
pub use sequence::PlaybackSequence;
pub use sequencer::PlaybackSequencer;
pub use session::{
    correct_seek, PlaybackLoop, PlaybackSession, SeekOutcome, SessionId, SessionRegistry,
};
pub use shuffle::ShuffleSequence;
pub use types::{
    PlaybackState, PlaybackTransition, RepeatMode, SeekPosition, SequenceInfo, ShuffleMode,
};
