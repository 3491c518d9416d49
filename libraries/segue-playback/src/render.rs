//! Render and preparation seams
//!
//! The engine never decodes audio itself. It drives an [`AudioRenderer`]
//! through session-scoped calls and asks a [`TrackPreparer`] to load
//! decode-readiness info before a track can start.

use crate::error::{InvalidTrackError, Result};
use crate::session::PlaybackSession;
use segue_core::Track;

/// Platform audio render/scheduler
///
/// Every scheduling call carries the session it belongs to. Completion
/// callbacks raised later must quote that session's id so stale ones can be
/// dropped (see [`SessionRegistry::is_current`](crate::SessionRegistry::is_current)).
pub trait AudioRenderer: Send {
    /// Schedule straight playback of the session's track from `start_time`
    fn schedule_track(&mut self, session: &PlaybackSession, start_time: f64);

    /// Schedule loop-aware playback of the session's complete loop
    fn schedule_loop(&mut self, session: &PlaybackSession, start_time: f64, is_playing: bool);

    /// Reschedule the session's track from `time`
    ///
    /// When `is_playing` is false the renderer stays paused at `time`.
    fn seek(&mut self, session: &PlaybackSession, time: f64, is_playing: bool);

    /// Pause output
    fn pause(&mut self);

    /// Resume output
    fn resume(&mut self);

    /// Stop output and drop everything scheduled
    fn stop(&mut self);

    /// Seconds elapsed in the playing track
    fn seek_position(&self) -> f64;

    /// Rebuild the output graph after an output device change
    fn restart_engine(&mut self) -> Result<()>;
}

/// Loads decode-readiness info for a track
///
/// May be slow; called from the preparation worker as well as the control
/// thread, so implementations must be thread-safe.
pub trait TrackPreparer: Send + Sync {
    /// Prepare a track for playback
    ///
    /// Implementations typically record the duration on the track.
    fn prepare(&self, track: &Track) -> std::result::Result<(), InvalidTrackError>;

    /// Whether the track must be transcoded before it can play
    fn needs_transcoding(&self, _track: &Track) -> bool {
        false
    }
}

/// Renderer that records calls, for unit tests
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    pub calls: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    pub position: std::sync::Arc<std::sync::Mutex<f64>>,
}

#[cfg(test)]
impl RecordingRenderer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_position(&self, seconds: f64) {
        *self.position.lock().unwrap() = seconds;
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[cfg(test)]
impl AudioRenderer for RecordingRenderer {
    fn schedule_track(&mut self, session: &PlaybackSession, start_time: f64) {
        self.set_position(start_time);
        self.record(format!("schedule_track {} {start_time}", session.id()));
    }

    fn schedule_loop(&mut self, session: &PlaybackSession, start_time: f64, is_playing: bool) {
        self.set_position(start_time);
        self.record(format!("schedule_loop {} {start_time} {is_playing}", session.id()));
    }

    fn seek(&mut self, session: &PlaybackSession, time: f64, is_playing: bool) {
        self.set_position(time);
        self.record(format!("seek {} {time} {is_playing}", session.id()));
    }

    fn pause(&mut self) {
        self.record("pause".to_string());
    }

    fn resume(&mut self) {
        self.record("resume".to_string());
    }

    fn stop(&mut self) {
        self.record("stop".to_string());
    }

    fn seek_position(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    fn restart_engine(&mut self) -> Result<()> {
        self.record("restart_engine".to_string());
        Ok(())
    }
}
