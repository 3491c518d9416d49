//! Playback delegate
//!
//! The façade the UI talks to. Owns the collection, the sequencer and the
//! player, and runs every state change on the thread that calls it (the
//! control thread). Render and hardware threads reach it only through the
//! [`RenderNotifier`] inbox, drained by [`PlaybackDelegate::process_notifications`].
//!
//! After each call the UI drains queued [`PlaybackEvent`]s with
//! [`PlaybackDelegate::drain_events`].

use crate::config::{ModeSettings, PlaybackConfig};
use crate::error::{PlaybackError, Result};
use crate::events::{PlaybackEvent, RenderNotification, RenderNotifier};
use crate::player::Player;
use crate::prefetch::PrepQueue;
use crate::render::{AudioRenderer, TrackPreparer};
use crate::sequencer::PlaybackSequencer;
use crate::session::{PlaybackLoop, SeekOutcome, SessionId, SessionRegistry};
use crate::types::{
    PlaybackState, PlaybackTransition, RepeatMode, SeekPosition, SequenceInfo, ShuffleMode,
};
use crossbeam_channel::{unbounded, Receiver};
use segue_core::{
    CollectionChange, GroupKey, GroupType, PlaylistView, Track, TrackCollection,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Who asked for a track to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayOrigin {
    /// The user (or UI) asked; errors go back to the caller
    Explicit,

    /// The previous track finished; errors become `TrackNotPlayed`
    AutoAdvance,
}

/// Orchestrates collection, sequencer and player
pub struct PlaybackDelegate {
    collection: TrackCollection,
    sequencer: PlaybackSequencer,
    player: Player,
    preparer: Arc<dyn TrackPreparer>,

    /// Present when prefetch is enabled
    prep_queue: Option<PrepQueue>,

    view: PlaylistView,
    config: PlaybackConfig,

    inbox: Receiver<RenderNotification>,
    notifier: RenderNotifier,

    pending_events: Vec<PlaybackEvent>,

    /// Last state reported through `StateChanged`
    reported_state: PlaybackState,
}

impl PlaybackDelegate {
    /// Create a delegate over an empty collection
    pub fn new(
        renderer: Box<dyn AudioRenderer>,
        preparer: Arc<dyn TrackPreparer>,
        config: PlaybackConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut sequencer = PlaybackSequencer::new(config.history_size);
        sequencer.set_repeat_mode(config.repeat);
        sequencer.set_shuffle_mode(config.shuffle);

        let prep_queue = if config.prefetch {
            Some(PrepQueue::new(preparer.clone())?)
        } else {
            None
        };

        let (sender, inbox) = unbounded();

        Ok(Self {
            collection: TrackCollection::new(),
            sequencer,
            player: Player::new(renderer),
            preparer,
            prep_queue,
            view: PlaylistView::Tracks,
            config,
            inbox,
            notifier: RenderNotifier::new(sender),
            pending_events: Vec::new(),
            reported_state: PlaybackState::NoTrack,
        })
    }

    // ===== State Queries =====

    /// The track collection
    pub fn collection(&self) -> &TrackCollection {
        &self.collection
    }

    /// Configuration in effect
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// How the UI presents the collection
    pub fn view(&self) -> PlaylistView {
        self.view
    }

    /// Set how the UI presents the collection; applies to the next sequence
    pub fn set_view(&mut self, view: PlaylistView) {
        self.view = view;
    }

    /// Player state
    pub fn playback_state(&self) -> PlaybackState {
        self.player.state()
    }

    /// Track playing or paused
    pub fn playing_track(&self) -> Option<Arc<Track>> {
        self.player.playing_track()
    }

    /// Segment loop of the playing track
    pub fn playback_loop(&self) -> Option<PlaybackLoop> {
        self.player.playback_loop()
    }

    /// Elapsed time, duration and percentage of the playing track
    pub fn seek_position(&self) -> SeekPosition {
        self.player.seek_position_info()
    }

    /// Scope, 1-based position and total of the sequence
    pub fn sequence_info(&self) -> SequenceInfo {
        self.sequencer.sequence_info()
    }

    /// Repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.sequencer.repeat_mode()
    }

    /// Shuffle mode
    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.sequencer.shuffle_mode()
    }

    /// Inbox handle for the render layer
    pub fn notifier(&self) -> RenderNotifier {
        self.notifier.clone()
    }

    /// Current-session slot, for render threads checking staleness
    pub fn sessions(&self) -> SessionRegistry {
        self.player.sessions().clone()
    }

    /// Take the events queued since the last call
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Playback Control =====

    /// Play, pause or resume depending on the state
    pub fn toggle_play_pause(&mut self) -> Result<PlaybackTransition> {
        let track = match self.player.state() {
            PlaybackState::Playing => {
                self.player.pause();
                None
            }
            PlaybackState::Paused => {
                self.player.resume();
                None
            }
            PlaybackState::NoTrack | PlaybackState::Waiting | PlaybackState::Transcoding => {
                match self.sequencer.begin(&self.collection, self.view) {
                    Some(track) => self.start_playback(track, PlayOrigin::Explicit)?,
                    None => {
                        tracing::debug!("Nothing to play");
                        None
                    }
                }
            }
        };
        self.report_state();

        Ok(PlaybackTransition {
            state: self.player.state(),
            track,
        })
    }

    /// Play the track at a flat collection index
    pub fn play_index(&mut self, index: usize) -> Result<Option<Arc<Track>>> {
        let track = self
            .sequencer
            .select_index(&self.collection, index)
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        self.start_playback(track, PlayOrigin::Explicit)
    }

    /// Play a track as seen in the current view
    pub fn play_track(&mut self, track: &Track) -> Result<Option<Arc<Track>>> {
        let not_found = || PlaybackError::TrackNotFound(track.path().to_path_buf());
        let track = self
            .collection
            .track_with_path(track.path())
            .cloned()
            .ok_or_else(not_found)?;
        let selected = self
            .sequencer
            .select_track(&self.collection, &track, self.view)
            .ok_or_else(not_found)?;
        self.start_playback(selected, PlayOrigin::Explicit)
    }

    /// Play a group from its first (or first shuffled) track
    pub fn play_group(&mut self, key: &GroupKey) -> Result<Option<Arc<Track>>> {
        if self.collection.find_group(key).is_none() {
            return Err(PlaybackError::GroupNotFound(key.clone()));
        }
        match self.sequencer.select_group(&self.collection, key) {
            Some(track) => self.start_playback(track, PlayOrigin::Explicit),
            None => Ok(None),
        }
    }

    /// Skip forward; `None` when there is no next track
    pub fn next_track(&mut self) -> Result<Option<Arc<Track>>> {
        if !self.player.state().is_active() {
            return Ok(None);
        }
        match self.sequencer.next(&self.collection) {
            Some(track) => self.start_playback(track, PlayOrigin::Explicit),
            None => Ok(None),
        }
    }

    /// Skip back; `None` when there is no previous track
    pub fn previous_track(&mut self) -> Result<Option<Arc<Track>>> {
        if !self.player.state().is_active() {
            return Ok(None);
        }
        match self.sequencer.previous(&self.collection) {
            Some(track) => self.start_playback(track, PlayOrigin::Explicit),
            None => Ok(None),
        }
    }

    /// Advance as if the playing track had finished
    ///
    /// Preparation failures are returned to the caller.
    pub fn subsequent_track(&mut self) -> Result<Option<Arc<Track>>> {
        match self.sequencer.subsequent(&self.collection) {
            Some(track) => self.start_playback(track, PlayOrigin::Explicit),
            None => {
                self.end_of_sequence();
                Ok(None)
            }
        }
    }

    /// Stop playback and end the sequence
    pub fn stop(&mut self) {
        let previous = self.player.playing_track();
        self.player.stop();
        self.sequencer.end();
        self.report_track_change(previous.as_deref(), None);
        self.report_state();
    }

    /// Prepare (if needed) and start a track
    fn start_playback(
        &mut self,
        track: Arc<Track>,
        origin: PlayOrigin,
    ) -> Result<Option<Arc<Track>>> {
        let previous = self.player.playing_track();

        if !track.is_prepared() {
            if self.preparer.needs_transcoding(&track) {
                self.player.transcoding();
            } else {
                self.player.wait();
            }
            self.report_state();

            let prepared = match &self.prep_queue {
                // Behind any background preparation of the same file
                Some(queue) => queue.prepare_now(&track),
                None => self.preparer.prepare(&track),
            };
            if let Err(error) = prepared {
                track.mark_invalid();
                tracing::warn!("Track not played: {}", error);

                self.player.stop();
                self.sequencer.end();
                self.report_track_change(previous.as_deref(), None);
                self.report_state();

                return match origin {
                    PlayOrigin::Explicit => Err(error.into()),
                    PlayOrigin::AutoAdvance => {
                        self.pending_events
                            .push(PlaybackEvent::TrackNotPlayed { error });
                        self.pending_events.push(PlaybackEvent::SequenceEnded);
                        Ok(None)
                    }
                };
            }
            track.mark_prepared();
        }

        self.player.play(track.clone(), 0.0, None);
        tracing::info!("Playing {}", track.display_name());

        self.report_track_change(previous.as_deref(), Some(track.as_ref()));
        self.report_state();
        self.prefetch();
        Ok(Some(track))
    }

    fn end_of_sequence(&mut self) {
        let previous = self.player.playing_track();
        self.player.stop();
        tracing::info!("Sequence ended");

        self.report_track_change(previous.as_deref(), None);
        self.report_state();
        self.pending_events.push(PlaybackEvent::SequenceEnded);
    }

    // ===== Render Notifications =====

    /// Handle every notification queued by render threads
    ///
    /// Returns how many were handled.
    pub fn process_notifications(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(notification) = self.inbox.try_recv() {
            match notification {
                RenderNotification::PlaybackCompleted { session_id } => {
                    self.handle_playback_completed(session_id);
                }
                RenderNotification::OutputDeviceChanged => {
                    if let Err(e) = self.handle_device_change() {
                        self.pending_events.push(PlaybackEvent::RenderFailed {
                            message: e.to_string(),
                        });
                    }
                }
            }
            handled += 1;
        }
        handled
    }

    /// A track scheduled under `session_id` finished naturally
    ///
    /// Ignored when the session is no longer current.
    pub fn handle_playback_completed(&mut self, session_id: SessionId) {
        if !self.player.sessions().is_current(session_id) {
            tracing::debug!("Ignoring completion of stale session {}", session_id);
            return;
        }
        self.track_playback_completed();
    }

    fn track_playback_completed(&mut self) {
        match self.sequencer.subsequent(&self.collection) {
            Some(track) => {
                if let Err(e) = self.start_playback(track, PlayOrigin::AutoAdvance) {
                    tracing::error!("Auto-advance failed: {}", e);
                }
            }
            None => self.end_of_sequence(),
        }
    }

    /// The audio output device changed
    pub fn handle_device_change(&mut self) -> Result<()> {
        let previous = self.player.playing_track();
        if let Err(e) = self.player.handle_device_change() {
            if previous.is_some() {
                self.sequencer.end();
                self.report_track_change(previous.as_deref(), None);
                self.report_state();
            }
            return Err(e);
        }
        Ok(())
    }

    // ===== Seek =====

    /// Seek forward by the configured step, staying inside a loop
    pub fn seek_forward(&mut self) -> Result<SeekOutcome> {
        let target = self.player.seek_position() + self.config.seek_step_secs;
        let outcome = self.player.attempt_seek_to_time(target)?;
        Ok(self.apply_seek(outcome))
    }

    /// Seek backward by the configured step, staying inside a loop
    pub fn seek_backward(&mut self) -> Result<SeekOutcome> {
        let target = self.player.seek_position() - self.config.seek_step_secs;
        let outcome = self.player.attempt_seek_to_time(target)?;
        Ok(self.apply_seek(outcome))
    }

    /// Seek to a time, leaving a loop if needed
    pub fn seek_to_time(&mut self, seconds: f64) -> Result<SeekOutcome> {
        let outcome = self.player.force_seek_to_time(seconds)?;
        Ok(self.apply_seek(outcome))
    }

    /// Seek to a percentage (0-100) of the track, leaving a loop if needed
    pub fn seek_to_percentage(&mut self, percentage: f64) -> Result<SeekOutcome> {
        let track = self
            .player
            .playing_track()
            .ok_or(PlaybackError::NoTrackPlaying)?;
        let target = percentage.clamp(0.0, 100.0) / 100.0 * track.duration_or_zero();
        let outcome = self.player.force_seek_to_time(target)?;
        Ok(self.apply_seek(outcome))
    }

    /// Restart the playing track (or its loop)
    pub fn replay_track(&mut self) -> Result<SeekOutcome> {
        let outcome = self.player.replay()?;
        Ok(self.apply_seek(outcome))
    }

    fn apply_seek(&mut self, outcome: SeekOutcome) -> SeekOutcome {
        match outcome {
            SeekOutcome::Seek { time, loop_removed } => {
                if loop_removed {
                    self.pending_events
                        .push(PlaybackEvent::LoopChanged { playback_loop: None });
                }
                self.pending_events
                    .push(PlaybackEvent::Seeked { position: time });
            }
            SeekOutcome::TrackCompleted => {
                tracing::debug!("Seek reached the end of the track");
                self.track_playback_completed();
            }
        }
        outcome
    }

    // ===== Segment Loop =====

    /// Cycle no loop -> start marked -> complete loop -> no loop
    pub fn toggle_loop(&mut self) -> Result<Option<PlaybackLoop>> {
        let playback_loop = self.player.toggle_loop()?;
        self.pending_events
            .push(PlaybackEvent::LoopChanged { playback_loop });
        Ok(playback_loop)
    }

    /// Define a complete loop and play it from its start
    pub fn define_loop(&mut self, start_time: f64, end_time: f64) -> Result<PlaybackLoop> {
        let playback_loop = self.player.define_loop(start_time, end_time)?;
        self.pending_events.push(PlaybackEvent::LoopChanged {
            playback_loop: Some(playback_loop),
        });
        Ok(playback_loop)
    }

    /// Remove the loop; playback continues where it is
    pub fn remove_loop(&mut self) -> Result<()> {
        self.player.remove_loop()?;
        self.pending_events
            .push(PlaybackEvent::LoopChanged { playback_loop: None });
        Ok(())
    }

    // ===== Shuffle & Repeat =====

    /// Set the repeat mode
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> (RepeatMode, ShuffleMode) {
        let modes = self.sequencer.set_repeat_mode(mode);
        self.modes_changed(modes)
    }

    /// Cycle the repeat mode
    pub fn toggle_repeat_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        let modes = self.sequencer.toggle_repeat_mode();
        self.modes_changed(modes)
    }

    /// Set the shuffle mode
    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) -> (RepeatMode, ShuffleMode) {
        let modes = self.sequencer.set_shuffle_mode(mode);
        self.modes_changed(modes)
    }

    /// Flip the shuffle mode
    pub fn toggle_shuffle_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        let modes = self.sequencer.toggle_shuffle_mode();
        self.modes_changed(modes)
    }

    /// Apply modes read from a settings store at startup
    pub fn apply_mode_settings(&mut self, settings: ModeSettings) -> (RepeatMode, ShuffleMode) {
        self.sequencer.set_repeat_mode(settings.repeat);
        let modes = self.sequencer.set_shuffle_mode(settings.shuffle);
        self.modes_changed(modes)
    }

    /// Modes to hand to a settings store at shutdown
    pub fn mode_settings(&self) -> ModeSettings {
        ModeSettings {
            repeat: self.sequencer.repeat_mode(),
            shuffle: self.sequencer.shuffle_mode(),
        }
    }

    fn modes_changed(&mut self, (repeat, shuffle): (RepeatMode, ShuffleMode)) -> (RepeatMode, ShuffleMode) {
        tracing::info!("Modes: repeat {:?}, shuffle {:?}", repeat, shuffle);
        self.pending_events
            .push(PlaybackEvent::ModesChanged { repeat, shuffle });
        self.prefetch();
        (repeat, shuffle)
    }

    // ===== Collection Management =====

    /// Append tracks, skipping paths already present
    pub fn add_tracks(&mut self, tracks: impl IntoIterator<Item = Track>) -> CollectionChange {
        let change = self.collection.add_tracks(tracks);
        self.collection_changed(&change);
        change
    }

    /// Insert tracks at a flat index
    pub fn insert_tracks(
        &mut self,
        at: usize,
        tracks: impl IntoIterator<Item = Track>,
    ) -> Result<CollectionChange> {
        let change = self.collection.insert_tracks(at, tracks)?;
        self.collection_changed(&change);
        Ok(change)
    }

    /// Remove tracks at flat indices; removing the playing track stops playback
    pub fn remove_tracks(&mut self, indices: &[usize]) -> Result<CollectionChange> {
        let change = self.collection.remove_tracks(indices)?;
        self.collection_changed(&change);
        Ok(change)
    }

    /// Move selected tracks up by one
    pub fn move_tracks_up(&mut self, indices: &[usize]) -> Result<CollectionChange> {
        let change = self.collection.move_tracks_up(indices)?;
        self.collection_changed(&change);
        Ok(change)
    }

    /// Move selected tracks down by one
    pub fn move_tracks_down(&mut self, indices: &[usize]) -> Result<CollectionChange> {
        let change = self.collection.move_tracks_down(indices)?;
        self.collection_changed(&change);
        Ok(change)
    }

    /// Move one track to a new flat index
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<CollectionChange> {
        let change = self.collection.move_track(from, to)?;
        self.collection_changed(&change);
        Ok(change)
    }

    /// Move a top-level group
    pub fn move_group(
        &mut self,
        group_type: GroupType,
        from: usize,
        to: usize,
    ) -> Result<CollectionChange> {
        let change = self.collection.move_group(group_type, from, to)?;
        self.collection_changed(&change);
        Ok(change)
    }

    /// Move a track or subgroup inside a group
    pub fn move_within_group(
        &mut self,
        key: &GroupKey,
        from: usize,
        to: usize,
    ) -> Result<CollectionChange> {
        let change = self.collection.move_within_group(key, from, to)?;
        self.collection_changed(&change);
        Ok(change)
    }

    /// Remove every track; playback stops
    pub fn clear_collection(&mut self) -> CollectionChange {
        let change = self.collection.clear();
        self.collection_changed(&change);
        change
    }

    fn collection_changed(&mut self, change: &CollectionChange) {
        let ended = self.sequencer.resync(&self.collection, change);
        if ended && self.player.state() != PlaybackState::NoTrack {
            let previous = self.player.playing_track();
            tracing::info!("Playing track left the sequence, stopping");
            self.player.stop();
            self.report_track_change(previous.as_deref(), None);
            self.report_state();
            self.pending_events.push(PlaybackEvent::SequenceEnded);
        }

        self.pending_events.push(PlaybackEvent::PlaylistChanged {
            size: self.collection.size(),
        });
        self.prefetch();
    }

    // ===== Prefetch =====

    /// Queue the tracks that could plausibly play next for preparation
    fn prefetch(&self) {
        let Some(queue) = &self.prep_queue else {
            return;
        };
        let playing = self.player.playing_track();

        let candidates = [
            self.sequencer.peek_subsequent(&self.collection),
            self.sequencer.peek_next(&self.collection),
            self.sequencer.peek_previous(&self.collection),
        ];

        let mut seen = HashSet::new();
        for track in candidates.into_iter().flatten() {
            if playing.as_ref().is_some_and(|p| p.path() == track.path()) {
                continue;
            }
            if seen.insert(track.path().to_path_buf()) {
                queue.enqueue(track);
            }
        }
    }

    /// Block until queued background preparations have finished
    pub fn wait_for_prefetch(&self) {
        if let Some(queue) = &self.prep_queue {
            queue.flush();
        }
    }

    // ===== Event helpers =====

    fn report_state(&mut self) {
        let state = self.player.state();
        if state != self.reported_state {
            self.reported_state = state;
            self.pending_events
                .push(PlaybackEvent::StateChanged { state });
        }
    }

    fn report_track_change(&mut self, previous: Option<&Track>, current: Option<&Track>) {
        let previous = previous.map(|t| t.path().to_path_buf());
        let current = current.map(|t| t.path().to_path_buf());
        if previous.is_none() && current.is_none() {
            return;
        }
        self.pending_events
            .push(PlaybackEvent::TrackChanged { previous, current });
    }
}

impl std::fmt::Debug for PlaybackDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackDelegate")
            .field("tracks", &self.collection.size())
            .field("player", &self.player)
            .field("view", &self.view)
            .field("scope", self.sequencer.scope())
            .finish_non_exhaustive()
    }
}
