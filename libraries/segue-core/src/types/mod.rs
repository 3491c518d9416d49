mod group;
mod track;

pub use group::{Group, GroupKey, GroupType, GroupedTrack, Grouping, PlaylistView};
pub use track::{Track, TrackMetadata};
