//! Integration tests for the track collection
//!
//! Groupings must stay in step with the flat list whatever sequence of
//! mutations is applied.

use proptest::prelude::*;
use segue_core::{
    CollectionChange, CoreError, GroupKey, GroupType, Track, TrackCollection, TrackMetadata,
};
use std::collections::HashSet;
use std::path::PathBuf;

// ===== Helpers =====

const ARTISTS: [&str; 4] = ["Nina", "Miles", "Alice", ""];
const ALBUMS: [&str; 3] = ["First", "Second", "Live"];

fn create_track(id: usize, artist: usize, album: usize, year: Option<u32>) -> Track {
    let artist = ARTISTS[artist % ARTISTS.len()];
    Track::with_metadata(
        format!("/music/{id:04}.flac"),
        TrackMetadata {
            title: Some(format!("Track {id}")),
            artist: (!artist.is_empty()).then(|| artist.to_string()),
            album: Some(ALBUMS[album % ALBUMS.len()].to_string()),
            year,
            ..Default::default()
        },
    )
    .with_duration(60.0 + id as f64)
}

/// Check every grouping covers every track exactly once, in agreement with
/// `grouping_info`
fn assert_groupings_consistent(collection: &TrackCollection) {
    let flat: HashSet<PathBuf> = collection
        .tracks()
        .iter()
        .map(|t| t.path().to_path_buf())
        .collect();
    assert_eq!(flat.len(), collection.size());

    for group_type in GroupType::ALL {
        let grouping = collection.grouping(group_type);
        assert_eq!(
            grouping.group_sizes().iter().sum::<usize>(),
            collection.size(),
            "{group_type} grouping lost or duplicated tracks"
        );

        let mut grouped = HashSet::new();
        for group in grouping.groups() {
            assert!(!group.is_empty(), "empty group {} kept", group.key());
            for track in group.all_tracks() {
                assert!(grouped.insert(track.path().to_path_buf()));
            }
        }
        assert_eq!(grouped, flat);

        for track in collection.tracks() {
            let info = collection.grouping_info(group_type, track).unwrap();
            let group = collection.find_group(&info.group).unwrap();
            assert_eq!(group.track_at(info.track_index).unwrap().path(), track.path());
        }
    }
}

// ===== Scenario Tests =====

#[test]
fn test_artist_hierarchy_nests_albums() {
    let mut collection = TrackCollection::new();
    collection.add_tracks(vec![
        create_track(1, 0, 0, Some(1965)),
        create_track(2, 1, 1, Some(1959)),
        create_track(3, 0, 1, Some(1966)),
        create_track(4, 0, 0, Some(1965)),
    ]);

    let nina = collection
        .find_group(&GroupKey::new(GroupType::Artist, "Nina"))
        .unwrap();
    assert_eq!(nina.size(), 3);
    assert_eq!(nina.subgroups().len(), 2);

    let first = nina.subgroup("First").unwrap();
    assert_eq!(first.key().to_string(), "Artist:Nina/First");
    assert_eq!(first.size(), 2);

    // Play order follows the subgroups
    let order: Vec<_> = nina.all_tracks().iter().map(|t| t.path().to_path_buf()).collect();
    assert_eq!(
        order,
        vec![
            PathBuf::from("/music/0001.flac"),
            PathBuf::from("/music/0004.flac"),
            PathBuf::from("/music/0003.flac"),
        ]
    );

    assert_eq!(collection.group_count(GroupType::Decade), 2);
    assert_groupings_consistent(&collection);
}

#[test]
fn test_untagged_tracks_get_unknown_groups() {
    let mut collection = TrackCollection::new();
    collection.add_tracks(vec![create_track(1, 3, 0, None)]);

    let unknown = GroupKey::new(GroupType::Artist, GroupType::Artist.unknown_name());
    assert!(collection.find_group(&unknown).is_some());
    let unknown_decade = GroupKey::new(GroupType::Decade, GroupType::Decade.unknown_name());
    assert!(collection.find_group(&unknown_decade).is_some());
}

#[test]
fn test_removal_reports_emptied_groups() {
    let mut collection = TrackCollection::new();
    collection.add_tracks(vec![create_track(1, 0, 0, None), create_track(2, 1, 0, None)]);

    let change = collection.remove_tracks(&[1]).unwrap();
    let CollectionChange::TracksRemoved(results) = change else {
        panic!("expected TracksRemoved");
    };
    assert_eq!(results.indices(), vec![1]);
    assert!(results
        .removed_groups
        .contains(&GroupKey::new(GroupType::Artist, "Miles")));
    assert!(collection
        .find_group(&GroupKey::new(GroupType::Artist, "Miles"))
        .is_none());
    assert_groupings_consistent(&collection);
}

#[test]
fn test_moving_groups_and_subgroups() {
    let mut collection = TrackCollection::new();
    collection.add_tracks(vec![
        create_track(1, 0, 0, None),
        create_track(2, 0, 1, None),
        create_track(3, 1, 0, None),
    ]);

    collection.move_group(GroupType::Artist, 1, 0).unwrap();
    assert_eq!(collection.groups(GroupType::Artist)[0].name(), "Miles");

    let nina = GroupKey::new(GroupType::Artist, "Nina");
    collection.move_within_group(&nina, 1, 0).unwrap();
    let group = collection.find_group(&nina).unwrap();
    assert_eq!(group.subgroups()[0].name(), "Second");

    assert!(matches!(
        collection.move_within_group(&GroupKey::new(GroupType::Artist, "Nobody"), 0, 1),
        Err(CoreError::GroupNotFound(_))
    ));
    assert!(matches!(
        collection.move_group(GroupType::Artist, 0, 5),
        Err(CoreError::IndexOutOfBounds(_))
    ));
    assert_groupings_consistent(&collection);
}

#[test]
fn test_group_duration_tracks_membership() {
    let mut collection = TrackCollection::new();
    collection.add_tracks(vec![create_track(1, 0, 0, None), create_track(2, 0, 0, None)]);
    let key = GroupKey::new(GroupType::Artist, "Nina");
    assert_eq!(collection.find_group(&key).unwrap().duration(), 61.0 + 62.0);

    collection.remove_tracks(&[0]).unwrap();
    assert_eq!(collection.find_group(&key).unwrap().duration(), 62.0);
}

// ===== Property Tests =====

#[derive(Debug, Clone)]
enum Mutation {
    Add(Vec<(usize, usize, Option<u32>)>),
    Insert(usize, Vec<(usize, usize, Option<u32>)>),
    Remove(Vec<usize>),
    MoveUp(Vec<usize>),
    MoveDown(Vec<usize>),
    Move(usize, usize),
}

fn arbitrary_specs() -> impl Strategy<Value = Vec<(usize, usize, Option<u32>)>> {
    prop::collection::vec(
        (0usize..4, 0usize..3, proptest::option::of(1950u32..2020)),
        0..6,
    )
}

fn arbitrary_mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        arbitrary_specs().prop_map(Mutation::Add),
        (0usize..20, arbitrary_specs()).prop_map(|(at, specs)| Mutation::Insert(at, specs)),
        prop::collection::vec(0usize..20, 0..4).prop_map(Mutation::Remove),
        prop::collection::vec(0usize..20, 0..4).prop_map(Mutation::MoveUp),
        prop::collection::vec(0usize..20, 0..4).prop_map(Mutation::MoveDown),
        (0usize..20, 0usize..20).prop_map(|(from, to)| Mutation::Move(from, to)),
    ]
}

proptest! {
    /// Property: groupings always partition the flat list
    #[test]
    fn groupings_follow_mutations(mutations in prop::collection::vec(arbitrary_mutation(), 1..25)) {
        let mut collection = TrackCollection::new();
        let mut next_id = 0;
        let mut make = |specs: Vec<(usize, usize, Option<u32>)>| -> Vec<Track> {
            specs
                .into_iter()
                .map(|(artist, album, year)| {
                    next_id += 1;
                    create_track(next_id, artist, album, year)
                })
                .collect()
        };

        for mutation in mutations {
            let size = collection.size();
            let in_bounds = |indices: &[usize]| indices.iter().all(|&i| i < size);
            match mutation {
                Mutation::Add(specs) => {
                    let tracks = make(specs);
                    let count = tracks.len();
                    collection.add_tracks(tracks);
                    prop_assert_eq!(collection.size(), size + count);
                }
                Mutation::Insert(at, specs) => {
                    let tracks = make(specs);
                    let result = collection.insert_tracks(at, tracks);
                    prop_assert_eq!(result.is_ok(), at <= size);
                }
                Mutation::Remove(indices) => {
                    let result = collection.remove_tracks(&indices);
                    prop_assert_eq!(result.is_ok(), in_bounds(&indices));
                    if result.is_ok() {
                        let unique: HashSet<_> = indices.iter().collect();
                        prop_assert_eq!(collection.size(), size - unique.len());
                    } else {
                        prop_assert_eq!(collection.size(), size);
                    }
                }
                Mutation::MoveUp(indices) => {
                    let result = collection.move_tracks_up(&indices);
                    prop_assert_eq!(result.is_ok(), in_bounds(&indices));
                }
                Mutation::MoveDown(indices) => {
                    let result = collection.move_tracks_down(&indices);
                    prop_assert_eq!(result.is_ok(), in_bounds(&indices));
                }
                Mutation::Move(from, to) => {
                    let before: Vec<PathBuf> =
                        collection.tracks().iter().map(|t| t.path().to_path_buf()).collect();
                    let result = collection.move_track(from, to);
                    prop_assert_eq!(result.is_ok(), from < size && to < size);
                    if result.is_ok() {
                        prop_assert_eq!(collection.track_at(to).unwrap().path(), before[from].as_path());
                    }
                }
            }
            assert_groupings_consistent(&collection);
        }
    }
}
