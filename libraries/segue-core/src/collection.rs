//! Track collection
//!
//! Ordered, mutable list of tracks plus one grouping per [`GroupType`],
//! kept in step on every mutation. Each mutating call returns a
//! [`CollectionChange`] describing what happened so the playback layer can
//! resynchronise its cursor.

use crate::error::{CoreError, Result};
use crate::types::{GroupKey, GroupType, GroupedTrack, Group, Grouping, PlaylistView, Track};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Change notification produced by a collection mutation
#[derive(Debug, Clone)]
pub enum CollectionChange {
    /// Tracks were added
    TracksAdded {
        /// New flat indices, ascending
        indices: Vec<usize>,
    },

    /// Tracks were removed
    TracksRemoved(TrackRemovalResults),

    /// Order changed in one view of the collection
    TracksReordered {
        /// View whose order changed
        view: PlaylistView,
    },

    /// Every track was removed
    Cleared,
}

/// What a removal took out of the collection
#[derive(Debug, Clone, Default)]
pub struct TrackRemovalResults {
    /// Removed tracks with their former flat indices, ascending
    pub removed: Vec<(usize, Arc<Track>)>,

    /// Top-level groups dropped because they became empty
    pub removed_groups: Vec<GroupKey>,
}

impl TrackRemovalResults {
    /// Former flat indices of the removed tracks
    pub fn indices(&self) -> Vec<usize> {
        self.removed.iter().map(|(index, _)| *index).collect()
    }

    /// Whether the track with this path was removed
    pub fn contains(&self, path: &Path) -> bool {
        self.removed.iter().any(|(_, t)| t.path() == path)
    }

    /// Number of removed tracks
    pub fn len(&self) -> usize {
        self.removed.len()
    }

    /// Whether nothing was removed
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Ordered collection of tracks with metadata groupings
#[derive(Debug, Clone)]
pub struct TrackCollection {
    /// Tracks in flat order
    tracks: Vec<Arc<Track>>,

    /// Paths currently in the collection (uniqueness)
    paths: HashSet<PathBuf>,

    /// One grouping per `GroupType`, indexed by `GroupType::ordinal`
    groupings: Vec<Grouping>,
}

impl TrackCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            paths: HashSet::new(),
            groupings: GroupType::ALL.iter().map(|t| Grouping::new(*t)).collect(),
        }
    }

    // ===== Flat access =====

    /// Number of tracks
    pub fn size(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the collection has no tracks
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks in flat order
    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    /// Track at a flat index
    pub fn track_at(&self, index: usize) -> Option<&Arc<Track>> {
        self.tracks.get(index)
    }

    /// Flat index of a track
    pub fn index_of(&self, track: &Track) -> Option<usize> {
        self.index_of_path(track.path())
    }

    /// Flat index of the track with this path
    pub fn index_of_path(&self, path: &Path) -> Option<usize> {
        if !self.paths.contains(path) {
            return None;
        }
        self.tracks.iter().position(|t| t.path() == path)
    }

    /// Track with this path
    pub fn track_with_path(&self, path: &Path) -> Option<&Arc<Track>> {
        self.index_of_path(path).map(|index| &self.tracks[index])
    }

    /// Whether a track with this path is in the collection
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Total duration in seconds (unknown durations count as zero)
    pub fn duration(&self) -> f64 {
        self.tracks.iter().map(|t| t.duration_or_zero()).sum()
    }

    // ===== Grouped access =====

    /// Grouping for a type
    pub fn grouping(&self, group_type: GroupType) -> &Grouping {
        &self.groupings[group_type.ordinal()]
    }

    /// Top-level groups of a type
    pub fn groups(&self, group_type: GroupType) -> &[Group] {
        self.grouping(group_type).groups()
    }

    /// Number of top-level groups of a type
    pub fn group_count(&self, group_type: GroupType) -> usize {
        self.grouping(group_type).group_count()
    }

    /// Top-level group at an index
    pub fn group_at(&self, group_type: GroupType, index: usize) -> Option<&Group> {
        self.grouping(group_type).group_at(index)
    }

    /// Resolve a group key
    pub fn find_group(&self, key: &GroupKey) -> Option<&Group> {
        self.grouping(key.group_type).find(key)
    }

    /// Locate a track inside a grouping
    pub fn grouping_info(&self, group_type: GroupType, track: &Track) -> Option<GroupedTrack> {
        if !self.contains(track.path()) {
            return None;
        }
        self.grouping(group_type).grouping_info(track)
    }

    // ===== Mutation =====

    /// Append tracks, skipping paths already present
    pub fn add_tracks(&mut self, tracks: impl IntoIterator<Item = Track>) -> CollectionChange {
        let mut indices = Vec::new();

        for track in tracks {
            if self.paths.contains(track.path()) {
                tracing::debug!("Skipping duplicate track {}", track.path().display());
                continue;
            }
            let track = Arc::new(track);
            self.register(&track);
            self.tracks.push(track);
            indices.push(self.tracks.len() - 1);
        }

        CollectionChange::TracksAdded { indices }
    }

    /// Insert tracks at a flat index, skipping paths already present
    pub fn insert_tracks(
        &mut self,
        at: usize,
        tracks: impl IntoIterator<Item = Track>,
    ) -> Result<CollectionChange> {
        if at > self.tracks.len() {
            return Err(CoreError::IndexOutOfBounds(at));
        }

        let mut indices = Vec::new();
        let mut position = at;
        for track in tracks {
            if self.paths.contains(track.path()) {
                tracing::debug!("Skipping duplicate track {}", track.path().display());
                continue;
            }
            let track = Arc::new(track);
            self.register(&track);
            self.tracks.insert(position, track);
            indices.push(position);
            position += 1;
        }

        Ok(CollectionChange::TracksAdded { indices })
    }

    /// Remove the tracks at these flat indices
    ///
    /// Fails without changing anything if any index is out of bounds.
    pub fn remove_tracks(&mut self, indices: &[usize]) -> Result<CollectionChange> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.tracks.len()) {
            return Err(CoreError::IndexOutOfBounds(bad));
        }

        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut results = TrackRemovalResults::default();
        // Remove from the back so earlier indices stay valid
        for &index in sorted.iter().rev() {
            let track = self.tracks.remove(index);
            self.paths.remove(track.path());
            for grouping in &mut self.groupings {
                if let Some(key) = grouping.remove_track(&track) {
                    results.removed_groups.push(key);
                }
            }
            results.removed.push((index, track));
        }
        results.removed.reverse();

        Ok(CollectionChange::TracksRemoved(results))
    }

    /// Move each selected track up by one, keeping selected tracks in order
    ///
    /// A track already at the top (or blocked by a selected track above it)
    /// stays where it is.
    pub fn move_tracks_up(&mut self, indices: &[usize]) -> Result<CollectionChange> {
        self.check_indices(indices)?;
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        // Lowest slot the next selected track may move into
        let mut next_free = 0;
        for index in sorted {
            if index > next_free {
                self.tracks.swap(index, index - 1);
                next_free = index;
            } else {
                next_free = index + 1;
            }
        }

        Ok(CollectionChange::TracksReordered {
            view: PlaylistView::Tracks,
        })
    }

    /// Move each selected track down by one, keeping selected tracks in order
    pub fn move_tracks_down(&mut self, indices: &[usize]) -> Result<CollectionChange> {
        self.check_indices(indices)?;
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        // Highest slot the next selected track may move into
        let mut limit = self.tracks.len().saturating_sub(1);
        for index in sorted.into_iter().rev() {
            if index < limit {
                self.tracks.swap(index, index + 1);
                limit = index;
            } else {
                limit = index.saturating_sub(1);
            }
        }

        Ok(CollectionChange::TracksReordered {
            view: PlaylistView::Tracks,
        })
    }

    /// Move one track to a new flat index
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<CollectionChange> {
        self.check_indices(&[from, to])?;
        if from != to {
            let track = self.tracks.remove(from);
            self.tracks.insert(to, track);
        }
        Ok(CollectionChange::TracksReordered {
            view: PlaylistView::Tracks,
        })
    }

    /// Move a top-level group within its grouping
    pub fn move_group(
        &mut self,
        group_type: GroupType,
        from: usize,
        to: usize,
    ) -> Result<CollectionChange> {
        let grouping = &mut self.groupings[group_type.ordinal()];
        if !grouping.move_group(from, to) {
            return Err(CoreError::IndexOutOfBounds(from.max(to)));
        }
        Ok(CollectionChange::TracksReordered {
            view: PlaylistView::Grouped(group_type),
        })
    }

    /// Move a track (or, for groups with subgroups, a subgroup) inside a group
    pub fn move_within_group(
        &mut self,
        key: &GroupKey,
        from: usize,
        to: usize,
    ) -> Result<CollectionChange> {
        let group = self.groupings[key.group_type.ordinal()]
            .find_mut(key)
            .ok_or_else(|| CoreError::GroupNotFound(key.clone()))?;

        let moved = if group.subgroups().is_empty() {
            group.move_direct_track(from, to)
        } else {
            group.move_subgroup(from, to)
        };
        if !moved {
            return Err(CoreError::IndexOutOfBounds(from.max(to)));
        }

        Ok(CollectionChange::TracksReordered {
            view: PlaylistView::Grouped(key.group_type),
        })
    }

    /// Remove every track
    pub fn clear(&mut self) -> CollectionChange {
        self.tracks.clear();
        self.paths.clear();
        for grouping in &mut self.groupings {
            grouping.clear();
        }
        CollectionChange::Cleared
    }

    fn register(&mut self, track: &Arc<Track>) {
        self.paths.insert(track.path().to_path_buf());
        for grouping in &mut self.groupings {
            grouping.add_track(track.clone());
        }
    }

    fn check_indices(&self, indices: &[usize]) -> Result<()> {
        match indices.iter().find(|&&i| i >= self.tracks.len()) {
            Some(&bad) => Err(CoreError::IndexOutOfBounds(bad)),
            None => Ok(()),
        }
    }
}

impl Default for TrackCollection {
    fn default() -> Self {
        Self::new()
    }
}
