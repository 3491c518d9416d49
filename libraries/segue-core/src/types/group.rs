//! Grouping hierarchy
//!
//! Tracks can be viewed flat or grouped by one metadata field. Each grouping
//! is a list of top-level groups; Artist groups additionally hold one Album
//! subgroup per album:
//!
//! ```text
//! Grouping(Artist)
//!   ├── Group "Nina"            depth 0
//!   │     ├── Group "Album 1"   depth 1, parent = Artist/Nina
//!   │     │     ├── track
//!   │     │     └── track
//!   │     └── Group "Album 2"
//!   └── Group "Unknown Artist"
//! ```
//!
//! Ownership flows downward only. A group's parent is recorded as a
//! [`GroupKey`], never as a pointer.

use crate::types::Track;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Metadata field a grouping is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupType {
    /// Artist tag, with one Album subgroup per album
    Artist,
    /// Album tag
    Album,
    /// Genre tag
    Genre,
    /// Release year, bucketed by decade
    Decade,
}

impl GroupType {
    /// Every grouping type, in the order collections maintain them
    pub const ALL: [GroupType; 4] = [
        GroupType::Artist,
        GroupType::Album,
        GroupType::Genre,
        GroupType::Decade,
    ];

    /// Type of the subgroups nested under groups of this type
    pub fn subgroup_type(self) -> Option<GroupType> {
        match self {
            GroupType::Artist => Some(GroupType::Album),
            GroupType::Album | GroupType::Genre | GroupType::Decade => None,
        }
    }

    /// Bucket name for tracks missing this field
    pub fn unknown_name(self) -> &'static str {
        match self {
            GroupType::Artist => "Unknown Artist",
            GroupType::Album => "Unknown Album",
            GroupType::Genre => "Unknown Genre",
            GroupType::Decade => "Unknown Decade",
        }
    }

    pub(crate) fn ordinal(self) -> usize {
        match self {
            GroupType::Artist => 0,
            GroupType::Album => 1,
            GroupType::Genre => 2,
            GroupType::Decade => 3,
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupType::Artist => "Artist",
            GroupType::Album => "Album",
            GroupType::Genre => "Genre",
            GroupType::Decade => "Decade",
        };
        f.write_str(name)
    }
}

/// The way the UI currently presents the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaylistView {
    /// Flat list of tracks in collection order
    Tracks,

    /// Tracks grouped by a metadata field
    Grouped(GroupType),
}

/// Non-owning reference to a group: the grouping type plus the names
/// from the top-level group down to the referenced group
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Grouping the group lives in
    pub group_type: GroupType,

    /// Names from the top-level group down (never empty)
    pub path: Vec<String>,
}

impl GroupKey {
    /// Key of a top-level group
    pub fn new(group_type: GroupType, name: impl Into<String>) -> Self {
        Self {
            group_type,
            path: vec![name.into()],
        }
    }

    /// Key of a subgroup of this group
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(name.into());
        Self {
            group_type: self.group_type,
            path,
        }
    }

    /// Name of the referenced group
    pub fn name(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }

    /// Depth of the referenced group (0 = top level)
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Key of the parent group, if this is a subgroup
    pub fn parent(&self) -> Option<GroupKey> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            group_type: self.group_type,
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Key of the top-level group this key lives under
    pub fn top_level(&self) -> GroupKey {
        Self {
            group_type: self.group_type,
            path: self.path.iter().take(1).cloned().collect(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_type, self.path.join("/"))
    }
}

/// A named node in a grouping hierarchy
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    group_type: GroupType,
    depth: usize,

    /// Non-owning back-reference
    parent: Option<GroupKey>,

    /// Direct tracks, unique by path, in insertion order
    tracks: Vec<Arc<Track>>,

    /// Nested groups, in insertion order
    subgroups: Vec<Group>,
}

impl Group {
    pub(crate) fn new(
        name: impl Into<String>,
        group_type: GroupType,
        parent: Option<GroupKey>,
    ) -> Self {
        let depth = parent.as_ref().map_or(0, |p| p.depth() + 1);
        Self {
            name: name.into(),
            group_type,
            depth,
            parent,
            tracks: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    /// Group name (e.g. the artist)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grouping type of the hierarchy this group is part of
    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    /// Depth in the hierarchy (0 = top level)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Key of the parent group
    pub fn parent(&self) -> Option<&GroupKey> {
        self.parent.as_ref()
    }

    /// Key referencing this group
    pub fn key(&self) -> GroupKey {
        match &self.parent {
            Some(parent) => parent.child(self.name.clone()),
            None => GroupKey::new(self.group_type, self.name.clone()),
        }
    }

    /// Direct (non-nested) tracks
    pub fn direct_tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    /// Nested groups
    pub fn subgroups(&self) -> &[Group] {
        &self.subgroups
    }

    /// Find a direct subgroup by name
    pub fn subgroup(&self, name: &str) -> Option<&Group> {
        self.subgroups.iter().find(|g| g.name == name)
    }

    /// Number of tracks, including nested ones
    pub fn size(&self) -> usize {
        self.tracks.len() + self.subgroups.iter().map(Group::size).sum::<usize>()
    }

    /// Whether the group holds no tracks at all
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Total duration in seconds, summed over nested tracks on every call
    pub fn duration(&self) -> f64 {
        let own: f64 = self.tracks.iter().map(|t| t.duration_or_zero()).sum();
        own + self.subgroups.iter().map(Group::duration).sum::<f64>()
    }

    /// All tracks in play order: subgroups first, then direct tracks
    pub fn all_tracks(&self) -> Vec<Arc<Track>> {
        let mut all = Vec::with_capacity(self.size());
        self.collect_tracks(&mut all);
        all
    }

    fn collect_tracks(&self, out: &mut Vec<Arc<Track>>) {
        for subgroup in &self.subgroups {
            subgroup.collect_tracks(out);
        }
        out.extend(self.tracks.iter().cloned());
    }

    /// Track at a position of the flattened play order
    pub fn track_at(&self, index: usize) -> Option<&Arc<Track>> {
        let mut remaining = index;
        for subgroup in &self.subgroups {
            let size = subgroup.size();
            if remaining < size {
                return subgroup.track_at(remaining);
            }
            remaining -= size;
        }
        self.tracks.get(remaining)
    }

    /// Position of a track in the flattened play order
    pub fn index_of(&self, path: &Path) -> Option<usize> {
        let mut offset = 0;
        for subgroup in &self.subgroups {
            if let Some(index) = subgroup.index_of(path) {
                return Some(offset + index);
            }
            offset += subgroup.size();
        }
        self.tracks
            .iter()
            .position(|t| t.path() == path)
            .map(|index| offset + index)
    }

    /// Whether the track is anywhere under this group
    pub fn contains(&self, path: &Path) -> bool {
        self.index_of(path).is_some()
    }

    /// Resolve a descendant by the remaining names of a key path
    pub(crate) fn descendant(&self, names: &[String]) -> Option<&Group> {
        match names.split_first() {
            None => Some(self),
            Some((first, rest)) => self.subgroup(first)?.descendant(rest),
        }
    }

    pub(crate) fn descendant_mut(&mut self, names: &[String]) -> Option<&mut Group> {
        match names.split_first() {
            None => Some(self),
            Some((first, rest)) => self
                .subgroups
                .iter_mut()
                .find(|g| &g.name == first)?
                .descendant_mut(rest),
        }
    }

    /// Add a track, creating the subgroup it belongs to if needed
    pub(crate) fn add_track(&mut self, track: Arc<Track>) {
        match self.group_type_for_children() {
            Some(sub_type) => {
                let name = track.group_name(sub_type);
                let position = match self.subgroups.iter().position(|g| g.name == name) {
                    Some(position) => position,
                    None => {
                        let parent = self.key();
                        self.subgroups
                            .push(Group::new(name, self.group_type, Some(parent)));
                        self.subgroups.len() - 1
                    }
                };
                self.subgroups[position].add_track(track);
            }
            None => {
                if !self.tracks.iter().any(|t| t.path() == track.path()) {
                    self.tracks.push(track);
                }
            }
        }
    }

    /// Remove a track from anywhere under this group, dropping subgroups left empty
    pub(crate) fn remove_track(&mut self, path: &Path) -> bool {
        if let Some(position) = self.tracks.iter().position(|t| t.path() == path) {
            self.tracks.remove(position);
            return true;
        }

        let mut removed = false;
        for subgroup in &mut self.subgroups {
            if subgroup.remove_track(path) {
                removed = true;
                break;
            }
        }
        if removed {
            self.subgroups.retain(|g| !g.is_empty());
        }
        removed
    }

    /// Move a direct track within this group
    pub(crate) fn move_direct_track(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tracks.len() || to >= self.tracks.len() {
            return false;
        }
        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);
        true
    }

    /// Move a subgroup within this group
    pub(crate) fn move_subgroup(&mut self, from: usize, to: usize) -> bool {
        if from >= self.subgroups.len() || to >= self.subgroups.len() {
            return false;
        }
        let group = self.subgroups.remove(from);
        self.subgroups.insert(to, group);
        true
    }

    /// Subgroups only exist one level below the top for types that nest
    fn group_type_for_children(&self) -> Option<GroupType> {
        if self.depth == 0 {
            self.group_type.subgroup_type()
        } else {
            None
        }
    }
}

/// Where a track sits inside a grouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedTrack {
    /// Key of the top-level group holding the track
    pub group: GroupKey,

    /// Index of that group in the grouping
    pub group_index: usize,

    /// Index of the track in the group's flattened play order
    pub track_index: usize,
}

/// All groups of one type, in display order
#[derive(Debug, Clone)]
pub struct Grouping {
    group_type: GroupType,
    groups: Vec<Group>,
}

impl Grouping {
    pub(crate) fn new(group_type: GroupType) -> Self {
        Self {
            group_type,
            groups: Vec::new(),
        }
    }

    /// Grouping type
    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    /// Top-level groups, in display order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of top-level groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Top-level group at an index
    pub fn group_at(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    /// Track counts of the top-level groups, in order
    pub fn group_sizes(&self) -> Vec<usize> {
        self.groups.iter().map(Group::size).collect()
    }

    /// Resolve a key to a group
    pub fn find(&self, key: &GroupKey) -> Option<&Group> {
        if key.group_type != self.group_type {
            return None;
        }
        let (top, rest) = key.path.split_first()?;
        self.groups.iter().find(|g| &g.name == top)?.descendant(rest)
    }

    pub(crate) fn find_mut(&mut self, key: &GroupKey) -> Option<&mut Group> {
        if key.group_type != self.group_type {
            return None;
        }
        let (top, rest) = key.path.split_first()?;
        self.groups
            .iter_mut()
            .find(|g| &g.name == top)?
            .descendant_mut(rest)
    }

    /// Index of a top-level group by name
    pub fn index_of_group(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    /// Locate a track in this grouping
    pub fn grouping_info(&self, track: &Track) -> Option<GroupedTrack> {
        let name = track.group_name(self.group_type);
        let group_index = self.index_of_group(&name)?;
        let group = &self.groups[group_index];
        let track_index = group.index_of(track.path())?;

        Some(GroupedTrack {
            group: group.key(),
            group_index,
            track_index,
        })
    }

    pub(crate) fn add_track(&mut self, track: Arc<Track>) {
        let name = track.group_name(self.group_type);
        let position = match self.index_of_group(&name) {
            Some(position) => position,
            None => {
                self.groups.push(Group::new(name, self.group_type, None));
                self.groups.len() - 1
            }
        };
        self.groups[position].add_track(track);
    }

    /// Remove a track; returns the key of its top-level group if that group
    /// was dropped because it became empty
    pub(crate) fn remove_track(&mut self, track: &Track) -> Option<GroupKey> {
        let name = track.group_name(self.group_type);
        let position = self.index_of_group(&name)?;
        if !self.groups[position].remove_track(track.path()) {
            return None;
        }
        if self.groups[position].is_empty() {
            let removed = self.groups.remove(position);
            return Some(removed.key());
        }
        None
    }

    pub(crate) fn move_group(&mut self, from: usize, to: usize) -> bool {
        if from >= self.groups.len() || to >= self.groups.len() {
            return false;
        }
        let group = self.groups.remove(from);
        self.groups.insert(to, group);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackMetadata;

    fn track(path: &str, artist: &str, album: &str, secs: f64) -> Arc<Track> {
        Arc::new(
            Track::with_metadata(
                path,
                TrackMetadata {
                    artist: Some(artist.to_string()),
                    album: Some(album.to_string()),
                    ..Default::default()
                },
            )
            .with_duration(secs),
        )
    }

    fn artist_grouping() -> Grouping {
        let mut grouping = Grouping::new(GroupType::Artist);
        grouping.add_track(track("/m/1.mp3", "Nina", "First", 100.0));
        grouping.add_track(track("/m/2.mp3", "Miles", "Blue", 200.0));
        grouping.add_track(track("/m/3.mp3", "Nina", "Second", 50.0));
        grouping.add_track(track("/m/4.mp3", "Nina", "First", 25.0));
        grouping
    }

    #[test]
    fn artist_groups_nest_albums() {
        let grouping = artist_grouping();
        assert_eq!(grouping.group_count(), 2);

        let nina = grouping.group_at(0).unwrap();
        assert_eq!(nina.name(), "Nina");
        assert_eq!(nina.size(), 3);
        assert_eq!(nina.subgroups().len(), 2);

        let first = nina.subgroup("First").unwrap();
        assert_eq!(first.depth(), 1);
        assert_eq!(first.parent(), Some(&GroupKey::new(GroupType::Artist, "Nina")));
        assert_eq!(first.size(), 2);
    }

    #[test]
    fn flattened_order_follows_subgroups() {
        let grouping = artist_grouping();
        let nina = grouping.group_at(0).unwrap();

        let order: Vec<_> = nina
            .all_tracks()
            .iter()
            .map(|t| t.path().display().to_string())
            .collect();
        assert_eq!(order, vec!["/m/1.mp3", "/m/4.mp3", "/m/3.mp3"]);

        assert_eq!(nina.track_at(1).unwrap().path(), Path::new("/m/4.mp3"));
        assert_eq!(nina.index_of(Path::new("/m/3.mp3")), Some(2));
        assert!(nina.track_at(3).is_none());
    }

    #[test]
    fn duration_is_recomputed() {
        let mut grouping = artist_grouping();
        assert_eq!(grouping.group_at(0).unwrap().duration(), 175.0);

        let t4 = grouping.group_at(0).unwrap().track_at(1).unwrap().clone();
        grouping.remove_track(&t4);
        assert_eq!(grouping.group_at(0).unwrap().duration(), 150.0);
    }

    #[test]
    fn removing_last_track_drops_group() {
        let mut grouping = artist_grouping();
        let miles = grouping.group_at(1).unwrap().all_tracks()[0].clone();

        let dropped = grouping.remove_track(&miles);
        assert_eq!(dropped, Some(GroupKey::new(GroupType::Artist, "Miles")));
        assert_eq!(grouping.group_count(), 1);
    }

    #[test]
    fn removing_last_album_track_drops_subgroup() {
        let mut grouping = artist_grouping();
        let second = grouping.find(&GroupKey::new(GroupType::Artist, "Nina").child("Second"));
        let only = second.unwrap().all_tracks()[0].clone();

        assert_eq!(grouping.remove_track(&only), None);
        let nina = grouping.group_at(0).unwrap();
        assert!(nina.subgroup("Second").is_none());
        assert_eq!(nina.size(), 2);
    }

    #[test]
    fn grouping_info_locates_tracks() {
        let grouping = artist_grouping();
        let t3 = track("/m/3.mp3", "Nina", "Second", 50.0);

        let info = grouping.grouping_info(&t3).unwrap();
        assert_eq!(info.group, GroupKey::new(GroupType::Artist, "Nina"));
        assert_eq!(info.group_index, 0);
        assert_eq!(info.track_index, 2);

        let stranger = track("/m/9.mp3", "Nina", "First", 1.0);
        assert!(grouping.grouping_info(&stranger).is_none());
    }

    #[test]
    fn keys_resolve_and_describe_hierarchy() {
        let key = GroupKey::new(GroupType::Artist, "Nina").child("First");
        assert_eq!(key.depth(), 1);
        assert_eq!(key.name(), "First");
        assert_eq!(key.top_level(), GroupKey::new(GroupType::Artist, "Nina"));
        assert_eq!(key.to_string(), "Artist:Nina/First");

        let grouping = artist_grouping();
        assert_eq!(grouping.find(&key).unwrap().size(), 2);
        assert!(grouping
            .find(&GroupKey::new(GroupType::Genre, "Nina"))
            .is_none());
    }
}
