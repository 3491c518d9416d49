//! Segue Core
//!
//! Track collection and grouping hierarchy for the Segue playback engine.
//!
//! This crate provides the leaf of the engine, used by `segue-playback`:
//! - **Domain Types**: `Track`, `TrackMetadata`, `Group`, `GroupKey`
//! - **Collection**: `TrackCollection`, an ordered, mutable list of tracks
//!   with Artist/Album/Genre/Decade groupings maintained on every mutation
//! - **Change Notifications**: `CollectionChange` returned by each mutation
//! - **Error Handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use segue_core::{GroupType, Track, TrackCollection, TrackMetadata};
//!
//! let mut collection = TrackCollection::new();
//! collection.add_tracks(vec![
//!     Track::with_metadata(
//!         "/music/so_what.flac",
//!         TrackMetadata {
//!             artist: Some("Miles Davis".to_string()),
//!             album: Some("Kind of Blue".to_string()),
//!             ..Default::default()
//!         },
//!     ),
//!     Track::new("/music/untagged.mp3"),
//! ]);
//!
//! assert_eq!(collection.size(), 2);
//! assert_eq!(collection.group_count(GroupType::Artist), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod collection;
pub mod error;
pub mod types;

pub use collection::{CollectionChange, TrackCollection, TrackRemovalResults};
pub use error::{CoreError, Result};
pub use types::{
    Group, GroupKey, GroupType, GroupedTrack, Grouping, PlaylistView, Track, TrackMetadata,
};
