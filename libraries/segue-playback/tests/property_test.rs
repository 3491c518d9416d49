//! Property-based tests for sequencing
//!
//! Uses proptest to check cursor, repeat and shuffle invariants across many
//! random scope sizes and operation sequences.

use proptest::prelude::*;
use segue_core::{Track, TrackCollection};
use segue_playback::{PlaybackSequence, PlaybackSequencer, RepeatMode, ShuffleMode};
use std::collections::HashSet;

// ===== Helpers =====

fn collection_of(size: usize) -> TrackCollection {
    let mut collection = TrackCollection::new();
    collection.add_tracks((0..size).map(|i| Track::new(format!("/music/{i:03}.flac"))));
    collection
}

fn sequence(size: usize, repeat: RepeatMode, shuffle: ShuffleMode) -> PlaybackSequence {
    let mut sequence = PlaybackSequence::default();
    sequence.set_repeat_mode(repeat);
    sequence.set_shuffle_mode(shuffle);
    sequence.reset(size, None);
    sequence
}

fn arbitrary_repeat() -> impl Strategy<Value = RepeatMode> {
    prop_oneof![
        Just(RepeatMode::Off),
        Just(RepeatMode::One),
        Just(RepeatMode::All)
    ]
}

fn arbitrary_shuffle() -> impl Strategy<Value = ShuffleMode> {
    prop_oneof![Just(ShuffleMode::Off), Just(ShuffleMode::On)]
}

/// Every index of a pass, sorted
fn sorted(mut indices: Vec<usize>) -> Vec<usize> {
    indices.sort_unstable();
    indices
}

// ===== Property Tests =====

proptest! {
    /// Property: the cursor is either unset or inside the scope
    #[test]
    fn cursor_stays_in_bounds(
        size in 1usize..30,
        repeat in arbitrary_repeat(),
        shuffle in arbitrary_shuffle(),
        operations in prop::collection::vec((0u8..8, 0usize..40), 1..60)
    ) {
        let mut sequence = sequence(size, repeat, shuffle);
        let mut size = size;

        for (op, arg) in operations {
            match op {
                0 => { sequence.subsequent(); }
                1 => { sequence.next(); }
                2 => { sequence.previous(); }
                3 => { sequence.select(arg); }
                4 => { sequence.toggle_repeat_mode(); }
                5 => { sequence.toggle_shuffle_mode(); }
                6 => {
                    size = arg % 30;
                    sequence.reset(size, Some(arg));
                }
                _ => sequence.end(),
            }

            prop_assert_eq!(sequence.size(), size);
            if let Some(cursor) = sequence.cursor() {
                prop_assert!(cursor < size, "cursor {} outside scope of {}", cursor, size);
            }
        }
    }

    /// Property: repeat One keeps returning the current index
    #[test]
    fn repeat_one_replays_the_cursor(
        size in 1usize..50,
        start in 0usize..50,
        rounds in 1usize..10
    ) {
        let start = start % size;
        let mut sequence = sequence(size, RepeatMode::One, ShuffleMode::Off);
        sequence.select(start);

        for _ in 0..rounds {
            prop_assert_eq!(sequence.subsequent(), Some(start));
        }
        prop_assert_eq!(sequence.cursor(), Some(start));
    }

    /// Property: one shuffle pass plays every index exactly once
    #[test]
    fn shuffle_pass_is_a_permutation(size in 1usize..60) {
        let mut sequence = sequence(size, RepeatMode::Off, ShuffleMode::On);

        let mut played = Vec::new();
        while let Some(index) = sequence.subsequent() {
            played.push(index);
            prop_assert!(played.len() <= size, "pass longer than the scope");
        }

        prop_assert_eq!(sorted(played), (0..size).collect::<Vec<_>>());
        prop_assert_eq!(sequence.cursor(), None);
    }

    /// Property: with repeat All, passes follow each other without playing
    /// the same index twice in a row
    #[test]
    fn reshuffled_passes_never_repeat_back_to_back(size in 2usize..20) {
        let mut sequence = sequence(size, RepeatMode::All, ShuffleMode::On);

        let played: Vec<usize> = (0..size * 3)
            .map(|_| sequence.subsequent())
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        prop_assert_eq!(played.len(), size * 3);

        for pass in played.chunks(size) {
            prop_assert_eq!(sorted(pass.to_vec()), (0..size).collect::<Vec<_>>());
        }
        for pair in played.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
    }

    /// Property: stepping back then forward through shuffle history
    /// revisits the same indices
    #[test]
    fn shuffle_history_is_symmetric(size in 2usize..40, steps in 1usize..40) {
        let steps = steps % size;
        let mut sequence = sequence(size, RepeatMode::Off, ShuffleMode::On);

        let mut forward = vec![sequence.subsequent().unwrap()];
        for _ in 0..steps {
            forward.push(sequence.next().unwrap());
        }

        let mut backward = Vec::new();
        for _ in 0..steps {
            backward.push(sequence.previous().unwrap());
        }
        prop_assert_eq!(sequence.cursor(), Some(forward[0]));
        // History ran out
        prop_assert_eq!(sequence.peek_previous(), None);

        let mut again = vec![forward[0]];
        for _ in 0..steps {
            again.push(sequence.next().unwrap());
        }
        prop_assert_eq!(again, forward.clone());

        backward.reverse();
        prop_assert_eq!(&backward[..], &forward[..steps]);
    }

    /// Property: removing other tracks never loses the playing track
    #[test]
    fn removal_keeps_the_playing_track(
        size in 2usize..30,
        playing in 0usize..30,
        removed in prop::collection::hash_set(0usize..30, 0..15),
        shuffle in arbitrary_shuffle()
    ) {
        let playing = playing % size;
        let mut collection = collection_of(size);
        let mut sequencer = PlaybackSequencer::default();
        sequencer.set_shuffle_mode(shuffle);

        let track = sequencer.select_index(&collection, playing).unwrap();

        let removed: Vec<usize> = removed
            .into_iter()
            .filter(|&i| i < size && i != playing)
            .collect();
        let change = collection.remove_tracks(&removed).unwrap();

        prop_assert!(!sequencer.resync(&collection, &change));
        prop_assert_eq!(sequencer.playing_track().map(|t| t.path()), Some(track.path()));

        let cursor = sequencer.sequence().cursor().unwrap();
        prop_assert_eq!(collection.track_at(cursor).unwrap().path(), track.path());
        prop_assert_eq!(sequencer.sequence().size(), size - removed.len());
    }

    /// Property: a shuffle pass survives mutation with every index accounted
    /// for exactly once
    #[test]
    fn shuffle_pass_survives_mutation(
        size in 2usize..30,
        advanced in 0usize..30,
        added in 0usize..10,
        removed in prop::collection::hash_set(0usize..30, 0..10)
    ) {
        let mut collection = collection_of(size);
        let mut sequencer = PlaybackSequencer::default();
        sequencer.set_shuffle_mode(ShuffleMode::On);
        sequencer.select_index(&collection, 0).unwrap();
        for _ in 0..advanced % size {
            sequencer.next(&collection);
        }
        let playing = sequencer.playing_track().unwrap().clone();

        let change = collection.add_tracks(
            (0..added).map(|i| Track::new(format!("/music/new-{i}.flac"))),
        );
        prop_assert!(!sequencer.resync(&collection, &change));

        let playing_index = collection.index_of(&playing).unwrap();
        let removed: Vec<usize> = removed
            .into_iter()
            .filter(|&i| i < collection.size() && i != playing_index)
            .collect();
        let change = collection.remove_tracks(&removed).unwrap();
        prop_assert!(!sequencer.resync(&collection, &change));

        let shuffle = sequencer.sequence().shuffle_sequence();
        let played = shuffle.played();
        let upcoming = shuffle.upcoming();

        let all: HashSet<usize> = played.iter().chain(upcoming.iter()).copied().collect();
        prop_assert_eq!(all.len(), played.len() + upcoming.len(), "index listed twice");
        prop_assert_eq!(all, (0..collection.size()).collect::<HashSet<_>>());
        prop_assert_eq!(played.last().copied(), sequencer.sequence().cursor());
    }
}
