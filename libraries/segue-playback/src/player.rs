//! Player
//!
//! Session-scoped control of the [`AudioRenderer`] plus the player state
//! machine. The player never picks tracks; the delegate tells it what to
//! play.

use crate::error::{PlaybackError, Result};
use crate::render::AudioRenderer;
use crate::session::{correct_seek, PlaybackLoop, PlaybackSession, SeekOutcome, SessionRegistry};
use crate::types::{PlaybackState, SeekPosition};
use segue_core::Track;
use std::sync::Arc;

/// Drives the renderer through playback sessions
pub struct Player {
    renderer: Box<dyn AudioRenderer>,
    sessions: SessionRegistry,
    state: PlaybackState,
}

impl Player {
    /// Create an idle player
    pub fn new(renderer: Box<dyn AudioRenderer>) -> Self {
        Self {
            renderer,
            sessions: SessionRegistry::new(),
            state: PlaybackState::NoTrack,
        }
    }

    // ===== State Queries =====

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Handle on the current-session slot, for render threads
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Current session, while a track is playing or paused
    pub fn current_session(&self) -> Option<Arc<PlaybackSession>> {
        if self.state.is_active() {
            self.sessions.current()
        } else {
            None
        }
    }

    /// Track playing or paused
    pub fn playing_track(&self) -> Option<Arc<Track>> {
        self.current_session().map(|s| s.track().clone())
    }

    /// Segment loop of the current session
    pub fn playback_loop(&self) -> Option<PlaybackLoop> {
        self.current_session().and_then(|s| s.playback_loop())
    }

    /// Seconds elapsed in the playing track (0 when idle)
    pub fn seek_position(&self) -> f64 {
        if self.state.is_active() {
            self.renderer.seek_position()
        } else {
            0.0
        }
    }

    /// Elapsed time, duration and percentage of the playing track
    pub fn seek_position_info(&self) -> SeekPosition {
        match self.playing_track() {
            Some(track) => SeekPosition::new(self.seek_position(), track.duration_or_zero()),
            None => SeekPosition::default(),
        }
    }

    // ===== Playback Control =====

    /// Play a track from `start_time`
    ///
    /// With `end_time`, a complete loop `[start_time, end_time)` is defined
    /// up front and loop-aware playback is scheduled.
    pub fn play(
        &mut self,
        track: Arc<Track>,
        start_time: f64,
        end_time: Option<f64>,
    ) -> Arc<PlaybackSession> {
        if self.state.is_active() {
            self.renderer.stop();
        }
        let playback_loop = end_time.map(|end| PlaybackLoop::between(start_time, end));
        let session = self.sessions.start(track, playback_loop);

        match playback_loop {
            Some(l) => self.renderer.schedule_loop(&session, l.start_time, true),
            None => self.renderer.schedule_track(&session, start_time),
        }

        self.set_state(PlaybackState::Playing);
        session
    }

    /// Pause a playing track
    pub fn pause(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Playing {
            self.renderer.pause();
            self.set_state(PlaybackState::Paused);
        }
        self.state
    }

    /// Resume a paused track
    pub fn resume(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Paused {
            self.renderer.resume();
            self.set_state(PlaybackState::Playing);
        }
        self.state
    }

    /// Stop playback and invalidate the session
    pub fn stop(&mut self) {
        if self.state != PlaybackState::NoTrack {
            self.renderer.stop();
        }
        self.sessions.end();
        self.set_state(PlaybackState::NoTrack);
    }

    /// Enter `Waiting` while a track is prepared
    pub fn wait(&mut self) {
        if self.state.is_active() {
            self.stop();
        }
        self.set_state(PlaybackState::Waiting);
    }

    /// Enter `Transcoding` while a track is converted
    pub fn transcoding(&mut self) {
        if self.state == PlaybackState::NoTrack || self.state.is_active() {
            self.wait();
        }
        self.set_state(PlaybackState::Transcoding);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::info!("Player state: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    // ===== Seek =====

    /// Seek, snapping into the loop if one is defined
    pub fn attempt_seek_to_time(&mut self, time: f64) -> Result<SeekOutcome> {
        self.seek(time, false)
    }

    /// Seek anywhere, dropping the loop if the target is outside it
    pub fn force_seek_to_time(&mut self, time: f64) -> Result<SeekOutcome> {
        self.seek(time, true)
    }

    /// Restart the track (or the loop) from its beginning
    pub fn replay(&mut self) -> Result<SeekOutcome> {
        let start = self.playback_loop().map_or(0.0, |l| l.start_time);
        self.seek(start, false)
    }

    fn seek(&mut self, time: f64, can_leave_loop: bool) -> Result<SeekOutcome> {
        let session = self.current_session().ok_or(PlaybackError::NoTrackPlaying)?;
        let is_playing = self.state == PlaybackState::Playing;
        let current_loop = session.playback_loop();

        let outcome = correct_seek(
            time,
            session.track().duration(),
            current_loop.as_ref(),
            can_leave_loop,
            is_playing,
        );

        if let SeekOutcome::Seek {
            time,
            loop_removed,
        } = outcome
        {
            let playback_loop = if loop_removed { None } else { current_loop };
            if loop_removed {
                tracing::info!("Seek to {:.2}s left the loop, removing it", time);
            }
            if let Some(next) = self.sessions.restart(playback_loop) {
                self.renderer.seek(&next, time, is_playing);
            }
        }
        Ok(outcome)
    }

    // ===== Segment Loop =====

    /// Cycle no loop -> start marked -> complete loop -> no loop
    ///
    /// Bounds are marked at the current position. Returns the loop in
    /// effect afterwards.
    pub fn toggle_loop(&mut self) -> Result<Option<PlaybackLoop>> {
        let position = self.seek_position();
        match self.playback_loop() {
            None => self.begin_loop(position).map(Some),
            Some(l) if !l.is_complete() => self.end_loop(position).map(Some),
            Some(_) => self.remove_loop().map(|()| None),
        }
    }

    /// Mark the loop start; playback is not rescheduled
    pub fn begin_loop(&mut self, start_time: f64) -> Result<PlaybackLoop> {
        if !self.state.is_active() {
            return Err(PlaybackError::NoTrackPlaying);
        }
        let playback_loop = PlaybackLoop::starting_at(start_time.max(0.0));
        self.sessions
            .update_loop(Some(playback_loop))
            .ok_or(PlaybackError::NoTrackPlaying)?;
        tracing::debug!("Loop start marked at {:.2}s", playback_loop.start_time);
        Ok(playback_loop)
    }

    /// Mark the loop end and restart playback from the loop start
    pub fn end_loop(&mut self, end_time: f64) -> Result<PlaybackLoop> {
        let start = match self.playback_loop() {
            Some(l) => l.start_time,
            None if self.state.is_active() => {
                return Err(PlaybackError::invalid_operation(
                    "loop end marked without a loop start",
                ));
            }
            None => return Err(PlaybackError::NoTrackPlaying),
        };
        self.define_loop(start, end_time)
    }

    /// Define a complete loop and play it from its start
    pub fn define_loop(&mut self, start_time: f64, end_time: f64) -> Result<PlaybackLoop> {
        if !self.state.is_active() {
            return Err(PlaybackError::NoTrackPlaying);
        }
        let playback_loop = PlaybackLoop::between(start_time.max(0.0), end_time.max(0.0));
        let is_playing = self.state == PlaybackState::Playing;

        let session = self
            .sessions
            .restart(Some(playback_loop))
            .ok_or(PlaybackError::NoTrackPlaying)?;
        self.renderer
            .schedule_loop(&session, playback_loop.start_time, is_playing);

        tracing::info!(
            "Loop defined: {:.2}s - {:.2}s",
            playback_loop.start_time,
            playback_loop.end_time.unwrap_or(playback_loop.start_time)
        );
        Ok(playback_loop)
    }

    /// Remove the loop; playback continues from the current position
    pub fn remove_loop(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(PlaybackError::NoTrackPlaying);
        }
        let position = self.seek_position();
        let is_playing = self.state == PlaybackState::Playing;

        let session = self
            .sessions
            .restart(None)
            .ok_or(PlaybackError::NoTrackPlaying)?;
        self.renderer.seek(&session, position, is_playing);
        tracing::info!("Loop removed");
        Ok(())
    }

    // ===== Device Changes =====

    /// Rebuild output after the audio device changed
    ///
    /// A playing or paused track resumes at the same position and state on a
    /// new session. If the engine cannot be restarted, playback stops.
    pub fn handle_device_change(&mut self) -> Result<()> {
        let Some(session) = self.current_session() else {
            return self.renderer.restart_engine().map_err(|e| {
                tracing::error!("Failed to restart audio engine: {}", e);
                e
            });
        };

        let position = self.renderer.seek_position();
        let is_playing = self.state == PlaybackState::Playing;

        if let Err(e) = self.renderer.restart_engine() {
            tracing::error!("Failed to restart audio engine, stopping playback: {}", e);
            self.stop();
            return Err(e);
        }

        let next = self.sessions.start(session.track().clone(), session.playback_loop());
        self.renderer.seek(&next, position, is_playing);
        tracing::info!(
            "Output device changed, resumed {} at {:.2}s",
            next.track().path().display(),
            position
        );
        Ok(())
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("state", &self.state)
            .field("session", &self.sessions.current_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;

    fn player() -> (Player, RecordingRenderer) {
        let renderer = RecordingRenderer::default();
        (Player::new(Box::new(renderer.clone())), renderer)
    }

    fn track() -> Arc<Track> {
        Arc::new(Track::new("/music/x.flac").with_duration(20.0))
    }

    #[test]
    fn state_machine() {
        let (mut player, _) = player();
        assert_eq!(player.state(), PlaybackState::NoTrack);
        assert_eq!(player.pause(), PlaybackState::NoTrack);

        player.wait();
        assert_eq!(player.state(), PlaybackState::Waiting);
        player.transcoding();
        assert_eq!(player.state(), PlaybackState::Transcoding);

        player.play(track(), 0.0, None);
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.pause(), PlaybackState::Paused);
        assert_eq!(player.resume(), PlaybackState::Playing);

        player.stop();
        assert_eq!(player.state(), PlaybackState::NoTrack);
        assert!(player.playing_track().is_none());
    }

    #[test]
    fn play_with_end_defines_a_loop() {
        let (mut player, renderer) = player();
        let session = player.play(track(), 3.0, Some(8.0));

        assert!(session.has_complete_loop());
        assert_eq!(player.playback_loop(), Some(PlaybackLoop::between(3.0, 8.0)));
        assert_eq!(
            renderer.calls(),
            vec![format!("schedule_loop {} 3 true", session.id())]
        );
    }

    #[test]
    fn seeking_starts_a_new_session() {
        let (mut player, _) = player();
        let first = player.play(track(), 0.0, None);

        let outcome = player.attempt_seek_to_time(12.0).unwrap();
        assert_eq!(
            outcome,
            SeekOutcome::Seek {
                time: 12.0,
                loop_removed: false
            }
        );
        assert!(!player.sessions().is_current(first.id()));
        assert_eq!(player.seek_position(), 12.0);
    }

    #[test]
    fn seek_past_end_reports_completion() {
        let (mut player, _) = player();
        let session = player.play(track(), 0.0, None);

        assert_eq!(
            player.force_seek_to_time(30.0).unwrap(),
            SeekOutcome::TrackCompleted
        );
        assert!(player.sessions().is_current(session.id()));
    }

    #[test]
    fn seek_without_track_fails() {
        let (mut player, _) = player();
        assert!(matches!(
            player.attempt_seek_to_time(1.0),
            Err(PlaybackError::NoTrackPlaying)
        ));
    }

    #[test]
    fn toggle_loop_cycles() {
        let (mut player, renderer) = player();
        let first = player.play(track(), 0.0, None);

        renderer.set_position(8.0);
        let marked = player.toggle_loop().unwrap().unwrap();
        assert!(!marked.is_complete());
        assert!(player.sessions().is_current(first.id()));

        renderer.set_position(3.0);
        let complete = player.toggle_loop().unwrap().unwrap();
        assert_eq!(complete, PlaybackLoop::between(3.0, 8.0));
        assert!(!player.sessions().is_current(first.id()));

        renderer.set_position(5.0);
        assert_eq!(player.toggle_loop().unwrap(), None);
        assert_eq!(player.playback_loop(), None);
        assert_eq!(player.seek_position(), 5.0);
    }

    #[test]
    fn replay_returns_to_loop_start() {
        let (mut player, renderer) = player();
        player.play(track(), 3.0, Some(8.0));
        renderer.set_position(6.5);

        player.replay().unwrap();
        assert_eq!(player.seek_position(), 3.0);
    }

    #[test]
    fn device_change_keeps_position_and_pause() {
        let (mut player, renderer) = player();
        let first = player.play(track(), 0.0, None);
        renderer.set_position(7.0);
        player.pause();

        player.handle_device_change().unwrap();

        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(!player.sessions().is_current(first.id()));
        let calls = renderer.calls();
        assert_eq!(calls[calls.len() - 2], "restart_engine");
        assert!(calls[calls.len() - 1].ends_with(" 7 false"));
    }
}
