//! Playback sequencer
//!
//! Binds a [`PlaybackSequence`] to a [`SequenceScope`] over the collection:
//! turns "the user clicked this track" into a scope index, turns sequence
//! indices back into tracks, and keeps the cursor on the playing track when
//! the collection changes shape underneath it.

use crate::scope::SequenceScope;
use crate::sequence::PlaybackSequence;
use crate::types::{RepeatMode, SequenceInfo, ShuffleMode};
use segue_core::{CollectionChange, GroupKey, PlaylistView, Track, TrackCollection};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sequence plus scope, resolved against a collection
#[derive(Debug, Clone)]
pub struct PlaybackSequencer {
    sequence: PlaybackSequence,
    scope: SequenceScope,

    /// Track the cursor points at
    playing: Option<Arc<Track>>,

    /// Scope contents when the sequence was last sized, for remapping
    scope_tracks: Vec<Arc<Track>>,
}

impl PlaybackSequencer {
    /// Create an idle sequencer over all tracks
    pub fn new(history_size: usize) -> Self {
        Self {
            sequence: PlaybackSequence::new(history_size),
            scope: SequenceScope::AllTracks,
            playing: None,
            scope_tracks: Vec::new(),
        }
    }

    /// Active scope
    pub fn scope(&self) -> &SequenceScope {
        &self.scope
    }

    /// Underlying sequence
    pub fn sequence(&self) -> &PlaybackSequence {
        &self.sequence
    }

    /// Track the sequence is positioned on
    pub fn playing_track(&self) -> Option<&Arc<Track>> {
        self.playing.as_ref()
    }

    /// Repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.sequence.repeat_mode()
    }

    /// Shuffle mode
    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.sequence.shuffle_mode()
    }

    // ===== Starting =====

    /// Start a sequence over the whole view and return its first track
    pub fn begin(&mut self, collection: &TrackCollection, view: PlaylistView) -> Option<Arc<Track>> {
        let scope = match view {
            PlaylistView::Tracks => SequenceScope::AllTracks,
            PlaylistView::Grouped(group_type) => SequenceScope::AllGroups(group_type),
        };
        self.set_scope(collection, scope, None)?;
        self.subsequent(collection)
    }

    /// Select a track by flat collection index
    pub fn select_index(&mut self, collection: &TrackCollection, index: usize) -> Option<Arc<Track>> {
        if index >= collection.size() {
            return None;
        }
        self.select_in_scope(collection, SequenceScope::AllTracks, index)
    }

    /// Select a track as seen in a view
    ///
    /// In a grouped view the scope becomes the track's top-level group.
    pub fn select_track(
        &mut self,
        collection: &TrackCollection,
        track: &Track,
        view: PlaylistView,
    ) -> Option<Arc<Track>> {
        let (scope, index) = match view {
            PlaylistView::Tracks => (SequenceScope::AllTracks, collection.index_of(track)?),
            PlaylistView::Grouped(group_type) => {
                let info = collection.grouping_info(group_type, track)?;
                (SequenceScope::Group(info.group), info.track_index)
            }
        };
        self.select_in_scope(collection, scope, index)
    }

    /// Scope to a group and start at its first (or first shuffled) track
    pub fn select_group(&mut self, collection: &TrackCollection, key: &GroupKey) -> Option<Arc<Track>> {
        self.set_scope(collection, SequenceScope::Group(key.clone()), None)?;
        self.subsequent(collection)
    }

    fn select_in_scope(
        &mut self,
        collection: &TrackCollection,
        scope: SequenceScope,
        index: usize,
    ) -> Option<Arc<Track>> {
        let same_scope = scope == self.scope
            && scope.size(collection) == Some(self.sequence.size())
            && self.scope_tracks.len() == self.sequence.size();

        if same_scope {
            // Keep the shuffle pass going
            self.sequence.select(index)?;
        } else {
            self.set_scope(collection, scope, Some(index))?;
        }
        self.resolve(collection, Some(index))
    }

    /// Resize the sequence for a new scope; `None` if the scope is gone
    fn set_scope(
        &mut self,
        collection: &TrackCollection,
        scope: SequenceScope,
        first: Option<usize>,
    ) -> Option<()> {
        let tracks = scope.tracks(collection)?;
        tracing::debug!("Sequence scope: {} ({} tracks)", scope, tracks.len());

        self.sequence.reset(tracks.len(), first);
        self.scope = scope;
        self.scope_tracks = tracks;
        self.playing = None;
        Some(())
    }

    // ===== Stepping =====

    /// Auto-advance; `None` ends the sequence
    pub fn subsequent(&mut self, collection: &TrackCollection) -> Option<Arc<Track>> {
        let index = self.sequence.subsequent();
        let track = self.resolve(collection, index);
        if track.is_none() {
            tracing::debug!("Sequence ended");
            self.end();
        }
        track
    }

    /// Explicit next; `None` keeps the current track
    pub fn next(&mut self, collection: &TrackCollection) -> Option<Arc<Track>> {
        let index = self.sequence.next()?;
        self.resolve(collection, Some(index))
    }

    /// Explicit previous; `None` keeps the current track
    pub fn previous(&mut self, collection: &TrackCollection) -> Option<Arc<Track>> {
        let index = self.sequence.previous()?;
        self.resolve(collection, Some(index))
    }

    /// Track `subsequent()` would return
    pub fn peek_subsequent(&self, collection: &TrackCollection) -> Option<Arc<Track>> {
        self.scope.track_at(collection, self.sequence.peek_subsequent()?)
    }

    /// Track `next()` would return
    pub fn peek_next(&self, collection: &TrackCollection) -> Option<Arc<Track>> {
        self.scope.track_at(collection, self.sequence.peek_next()?)
    }

    /// Track `previous()` would return
    pub fn peek_previous(&self, collection: &TrackCollection) -> Option<Arc<Track>> {
        self.scope.track_at(collection, self.sequence.peek_previous()?)
    }

    /// Stop sequencing; nothing is playing afterwards
    pub fn end(&mut self) {
        self.sequence.end();
        self.playing = None;
    }

    fn resolve(&mut self, collection: &TrackCollection, index: Option<usize>) -> Option<Arc<Track>> {
        let track = index.and_then(|i| self.scope.track_at(collection, i));
        if let Some(track) = &track {
            tracing::debug!("Sequence positioned on {}", track.path().display());
        }
        self.playing = track.clone();
        track
    }

    // ===== Modes =====

    /// Set the repeat mode; returns the resulting modes
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> (RepeatMode, ShuffleMode) {
        self.sequence.set_repeat_mode(mode)
    }

    /// Cycle the repeat mode; returns the resulting modes
    pub fn toggle_repeat_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        self.sequence.toggle_repeat_mode()
    }

    /// Set the shuffle mode; returns the resulting modes
    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) -> (RepeatMode, ShuffleMode) {
        self.sequence.set_shuffle_mode(mode)
    }

    /// Flip the shuffle mode; returns the resulting modes
    pub fn toggle_shuffle_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        self.sequence.toggle_shuffle_mode()
    }

    /// Scope, 1-based position and total for display
    pub fn sequence_info(&self) -> SequenceInfo {
        SequenceInfo {
            scope: self.scope.clone(),
            track_index: self.sequence.cursor().map_or(0, |c| c + 1),
            total_tracks: self.sequence.size(),
        }
    }

    // ===== Collection changes =====

    /// Re-locate the playing track after a collection mutation
    ///
    /// Returns `true` when the playing track (or its scope group) is gone
    /// and the sequence was ended.
    pub fn resync(&mut self, collection: &TrackCollection, change: &CollectionChange) -> bool {
        if matches!(change, CollectionChange::Cleared) {
            let was_playing = self.playing.is_some();
            self.scope = SequenceScope::AllTracks;
            self.scope_tracks.clear();
            self.sequence.reset(0, None);
            self.playing = None;
            return was_playing;
        }

        let Some(tracks) = self.scope.tracks(collection) else {
            tracing::warn!("Scope group {} no longer exists, ending sequence", self.scope);
            let was_playing = self.playing.is_some();
            self.scope = SequenceScope::AllTracks;
            self.scope_tracks = collection.tracks().to_vec();
            self.sequence.reset(collection.size(), None);
            self.playing = None;
            return was_playing;
        };

        let Some(playing) = self.playing.clone() else {
            self.sequence.reset(tracks.len(), None);
            self.scope_tracks = tracks;
            return false;
        };

        let new_positions: HashMap<PathBuf, usize> = tracks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.path().to_path_buf(), i))
            .collect();

        let Some(&cursor) = new_positions.get(playing.path()) else {
            tracing::info!("Playing track {} was removed", playing.path().display());
            self.sequence.reset(tracks.len(), None);
            self.scope_tracks = tracks;
            self.playing = None;
            return true;
        };

        let old_paths: HashSet<&Path> = self.scope_tracks.iter().map(|t| t.path()).collect();
        let added: Vec<usize> = tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| !old_paths.contains(t.path()))
            .map(|(i, _)| i)
            .collect();

        let old_tracks = &self.scope_tracks;
        self.sequence.remap(
            tracks.len(),
            Some(cursor),
            |old| {
                old_tracks
                    .get(old)
                    .and_then(|t| new_positions.get(t.path()).copied())
            },
            &added,
        );

        tracing::debug!(
            "Playing track {} relocated to index {}",
            playing.path().display(),
            cursor
        );
        self.scope_tracks = tracks;
        false
    }
}

impl Default for PlaybackSequencer {
    fn default() -> Self {
        Self::new(50)
    }
}
