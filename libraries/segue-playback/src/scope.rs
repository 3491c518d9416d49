//! Sequence scope
//!
//! The subset of the collection a sequence runs over, plus the mapping
//! between absolute scope indices and (group, track) coordinates.

use segue_core::{GroupKey, GroupType, Track, TrackCollection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Active subset of the collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceScope {
    /// Every track, in flat collection order
    AllTracks,

    /// Every track, walking all groups of one type in grouped order
    AllGroups(GroupType),

    /// Tracks of one group (nested tracks included)
    Group(GroupKey),
}

/// Position inside a grouped playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupedIndex {
    /// Index of the top-level group
    pub group_index: usize,

    /// Index of the track inside that group
    pub track_index: usize,
}

/// Map an absolute index to group coordinates
///
/// Accumulates group sizes until the running total passes `absolute`.
/// Returns `None` when `absolute` is past the last track.
pub fn to_grouped(group_sizes: &[usize], absolute: usize) -> Option<GroupedIndex> {
    let mut offset = 0;
    for (group_index, &size) in group_sizes.iter().enumerate() {
        if absolute < offset + size {
            return Some(GroupedIndex {
                group_index,
                track_index: absolute - offset,
            });
        }
        offset += size;
    }
    None
}

/// Map group coordinates back to an absolute index
///
/// Returns `None` for a group or track index that does not exist.
pub fn to_absolute(group_sizes: &[usize], grouped: GroupedIndex) -> Option<usize> {
    let size = *group_sizes.get(grouped.group_index)?;
    if grouped.track_index >= size {
        return None;
    }
    let preceding: usize = group_sizes[..grouped.group_index].iter().sum();
    Some(preceding + grouped.track_index)
}

impl SequenceScope {
    /// Number of tracks in scope, `None` if the scoped group no longer exists
    pub fn size(&self, collection: &TrackCollection) -> Option<usize> {
        match self {
            SequenceScope::AllTracks => Some(collection.size()),
            SequenceScope::AllGroups(group_type) => Some(
                collection
                    .grouping(*group_type)
                    .group_sizes()
                    .iter()
                    .sum(),
            ),
            SequenceScope::Group(key) => collection.find_group(key).map(|g| g.size()),
        }
    }

    /// Track at a scope index
    pub fn track_at(&self, collection: &TrackCollection, index: usize) -> Option<Arc<Track>> {
        match self {
            SequenceScope::AllTracks => collection.track_at(index).cloned(),
            SequenceScope::AllGroups(group_type) => {
                let grouping = collection.grouping(*group_type);
                let grouped = to_grouped(&grouping.group_sizes(), index)?;
                grouping
                    .group_at(grouped.group_index)?
                    .track_at(grouped.track_index)
                    .cloned()
            }
            SequenceScope::Group(key) => collection.find_group(key)?.track_at(index).cloned(),
        }
    }

    /// Scope index of a track
    pub fn index_of(&self, collection: &TrackCollection, track: &Track) -> Option<usize> {
        match self {
            SequenceScope::AllTracks => collection.index_of(track),
            SequenceScope::AllGroups(group_type) => {
                let info = collection.grouping_info(*group_type, track)?;
                to_absolute(
                    &collection.grouping(*group_type).group_sizes(),
                    GroupedIndex {
                        group_index: info.group_index,
                        track_index: info.track_index,
                    },
                )
            }
            SequenceScope::Group(key) => collection.find_group(key)?.index_of(track.path()),
        }
    }

    /// All tracks in scope order, `None` if the scoped group no longer exists
    pub fn tracks(&self, collection: &TrackCollection) -> Option<Vec<Arc<Track>>> {
        match self {
            SequenceScope::AllTracks => Some(collection.tracks().to_vec()),
            SequenceScope::AllGroups(group_type) => Some(
                collection
                    .groups(*group_type)
                    .iter()
                    .flat_map(|g| g.all_tracks())
                    .collect(),
            ),
            SequenceScope::Group(key) => collection.find_group(key).map(|g| g.all_tracks()),
        }
    }

    /// Key of the scoped group, if scoped to one
    pub fn group_key(&self) -> Option<&GroupKey> {
        match self {
            SequenceScope::Group(key) => Some(key),
            SequenceScope::AllTracks | SequenceScope::AllGroups(_) => None,
        }
    }
}

impl fmt::Display for SequenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceScope::AllTracks => f.write_str("All tracks"),
            SequenceScope::AllGroups(group_type) => write!(f, "All {group_type} groups"),
            SequenceScope::Group(key) => write!(f, "{}: {}", key.group_type, key.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use segue_core::TrackMetadata;

    fn collection() -> TrackCollection {
        let mut collection = TrackCollection::new();
        let tagged = |name: &str, artist: &str, album: &str| {
            Track::with_metadata(
                format!("/music/{name}.flac"),
                TrackMetadata {
                    artist: Some(artist.to_string()),
                    album: Some(album.to_string()),
                    ..Default::default()
                },
            )
        };
        collection.add_tracks(vec![
            tagged("a", "Nina", "One"),
            tagged("b", "Miles", "Blue"),
            tagged("c", "Nina", "Two"),
            tagged("d", "Nina", "One"),
        ]);
        collection
    }

    #[test]
    fn grouped_mapping_examples() {
        let sizes = [3, 0, 2];
        assert_eq!(
            to_grouped(&sizes, 3),
            Some(GroupedIndex {
                group_index: 2,
                track_index: 0
            })
        );
        assert_eq!(to_grouped(&sizes, 5), None);
        assert_eq!(
            to_absolute(
                &sizes,
                GroupedIndex {
                    group_index: 2,
                    track_index: 1
                }
            ),
            Some(4)
        );
        assert_eq!(
            to_absolute(
                &sizes,
                GroupedIndex {
                    group_index: 1,
                    track_index: 0
                }
            ),
            None
        );
    }

    #[test]
    fn all_groups_scope_walks_grouped_order() {
        let collection = collection();
        let scope = SequenceScope::AllGroups(GroupType::Artist);

        assert_eq!(scope.size(&collection), Some(4));
        let order: Vec<_> = scope
            .tracks(&collection)
            .unwrap()
            .iter()
            .map(|t| t.path().file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        // Nina: album One (a, d), album Two (c); then Miles
        assert_eq!(order, vec!["a", "d", "c", "b"]);

        let c = collection.track_at(2).unwrap().clone();
        assert_eq!(scope.index_of(&collection, &c), Some(2));
        assert_eq!(scope.track_at(&collection, 3).unwrap().path(), collection.track_at(1).unwrap().path());
    }

    #[test]
    fn group_scope_vanishes_with_its_group() {
        let mut collection = collection();
        let scope = SequenceScope::Group(GroupKey::new(GroupType::Artist, "Miles"));
        assert_eq!(scope.size(&collection), Some(1));

        collection.remove_tracks(&[1]).unwrap();
        assert_eq!(scope.size(&collection), None);
        assert!(scope.tracks(&collection).is_none());
        assert!(scope.track_at(&collection, 0).is_none());
    }

    #[test]
    fn display_names_the_scope() {
        let scope = SequenceScope::Group(GroupKey::new(GroupType::Artist, "Nina"));
        assert_eq!(scope.to_string(), "Artist: Nina");
        assert_eq!(SequenceScope::AllTracks.to_string(), "All tracks");
    }

    proptest! {
        #[test]
        fn grouped_round_trip(
            sizes in prop::collection::vec(0usize..8, 1..12),
            seed in any::<usize>(),
        ) {
            let total: usize = sizes.iter().sum();
            prop_assume!(total > 0);
            let absolute = seed % total;

            let grouped = to_grouped(&sizes, absolute).unwrap();
            prop_assert!(grouped.track_index < sizes[grouped.group_index]);
            prop_assert_eq!(to_absolute(&sizes, grouped), Some(absolute));
        }
    }
}
