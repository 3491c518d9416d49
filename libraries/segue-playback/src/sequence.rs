//! Playback sequence
//!
//! Decides which scope index plays next given the scope size, the cursor
//! and the repeat/shuffle modes. Knows nothing about tracks or audio.
//!
//! | repeat | shuffle | `subsequent()`                                     |
//! |--------|---------|----------------------------------------------------|
//! | Off    | Off     | cursor + 1, or `None` at the end                   |
//! | One    | Off     | the cursor again                                   |
//! | All    | Off     | (cursor + 1) % size                                |
//! | Off    | On      | next of the permutation, `None` when exhausted     |
//! | All    | On      | next of the permutation, reshuffling when exhausted|

use crate::shuffle::ShuffleSequence;
use crate::types::{RepeatMode, ShuffleMode};

/// Cursor plus modes over a scope of `size` indices
///
/// The cursor is `None` exactly when nothing is selected, and otherwise
/// always lies in `0..size`.
#[derive(Debug, Clone)]
pub struct PlaybackSequence {
    size: usize,
    cursor: Option<usize>,
    repeat: RepeatMode,
    shuffle: ShuffleMode,
    shuffle_sequence: ShuffleSequence,
}

impl PlaybackSequence {
    /// Create an empty sequence
    ///
    /// `history_size` bounds how far `previous()` can walk back while
    /// shuffling.
    pub fn new(history_size: usize) -> Self {
        Self {
            size: 0,
            cursor: None,
            repeat: RepeatMode::Off,
            shuffle: ShuffleMode::Off,
            shuffle_sequence: ShuffleSequence::new(history_size),
        }
    }

    /// Number of indices in scope
    pub fn size(&self) -> usize {
        self.size
    }

    /// Currently selected index
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    /// Shuffle mode
    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.shuffle
    }

    /// Shuffle state (meaningful only while shuffle is on)
    pub fn shuffle_sequence(&self) -> &ShuffleSequence {
        &self.shuffle_sequence
    }

    /// Resize, optionally starting at `first`
    ///
    /// With shuffle on, a new permutation is generated with `first`
    /// pinned as already played.
    pub fn reset(&mut self, size: usize, first: Option<usize>) {
        self.size = size;
        self.cursor = first.filter(|&i| i < size);

        match self.shuffle {
            ShuffleMode::On => self.shuffle_sequence.reset(size, self.cursor),
            ShuffleMode::Off => self.shuffle_sequence.clear(),
        }
    }

    /// Deselect without resizing
    pub fn end(&mut self) {
        self.reset(self.size, None);
    }

    /// Select an index directly
    ///
    /// While shuffling, the rest of the pass keeps its order.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if index >= self.size {
            return None;
        }
        self.cursor = Some(index);
        if self.shuffle == ShuffleMode::On {
            self.shuffle_sequence.select(index);
        }
        self.cursor
    }

    // ===== Advancing =====

    /// Auto-advance after the current track finished
    pub fn subsequent(&mut self) -> Option<usize> {
        if self.size == 0 {
            return None;
        }

        let next = match (self.repeat, self.shuffle) {
            (RepeatMode::One, _) => Some(self.cursor.unwrap_or(0)),
            (repeat, ShuffleMode::On) => self.advance_shuffle(repeat),
            (RepeatMode::All, ShuffleMode::Off) => {
                Some(self.cursor.map_or(0, |c| (c + 1) % self.size))
            }
            (RepeatMode::Off, ShuffleMode::Off) => match self.cursor {
                None => Some(0),
                Some(c) if c + 1 < self.size => Some(c + 1),
                Some(_) => None,
            },
        };

        // Running off the end ends the sequence
        self.cursor = next;
        next
    }

    /// Explicit step forward; `None` leaves the cursor where it is
    pub fn next(&mut self) -> Option<usize> {
        let cursor = self.cursor?;

        let next = match self.shuffle {
            ShuffleMode::On => self.advance_shuffle(self.repeat),
            ShuffleMode::Off => {
                if cursor + 1 < self.size {
                    Some(cursor + 1)
                } else if self.repeat == RepeatMode::All {
                    Some(0)
                } else {
                    None
                }
            }
        };

        if next.is_some() {
            self.cursor = next;
        }
        next
    }

    /// Explicit step back; `None` leaves the cursor where it is
    pub fn previous(&mut self) -> Option<usize> {
        let cursor = self.cursor?;

        let previous = match self.shuffle {
            ShuffleMode::On => self.shuffle_sequence.retreat(),
            ShuffleMode::Off => {
                if cursor > 0 {
                    Some(cursor - 1)
                } else if self.repeat == RepeatMode::All {
                    Some(self.size - 1)
                } else {
                    None
                }
            }
        };

        if previous.is_some() {
            self.cursor = previous;
        }
        previous
    }

    fn advance_shuffle(&mut self, repeat: RepeatMode) -> Option<usize> {
        if self.shuffle_sequence.is_exhausted() {
            if repeat != RepeatMode::All {
                return None;
            }
            tracing::debug!("Shuffle pass complete, reshuffling {} tracks", self.size);
            self.shuffle_sequence.start_new_pass(self.cursor);
        }
        self.shuffle_sequence.advance()
    }

    // ===== Peeking =====

    /// What `subsequent()` would return, without mutating anything
    pub fn peek_subsequent(&self) -> Option<usize> {
        if self.size == 0 {
            return None;
        }

        match (self.repeat, self.shuffle) {
            (RepeatMode::One, _) => Some(self.cursor.unwrap_or(0)),
            // The next permutation doesn't exist until a pass is generated
            (_, ShuffleMode::On) => self.shuffle_sequence.peek_next(),
            (RepeatMode::All, ShuffleMode::Off) => {
                Some(self.cursor.map_or(0, |c| (c + 1) % self.size))
            }
            (RepeatMode::Off, ShuffleMode::Off) => match self.cursor {
                None => Some(0),
                Some(c) if c + 1 < self.size => Some(c + 1),
                Some(_) => None,
            },
        }
    }

    /// What `next()` would return, without mutating anything
    pub fn peek_next(&self) -> Option<usize> {
        let cursor = self.cursor?;
        match self.shuffle {
            ShuffleMode::On => self.shuffle_sequence.peek_next(),
            ShuffleMode::Off => {
                if cursor + 1 < self.size {
                    Some(cursor + 1)
                } else if self.repeat == RepeatMode::All {
                    Some(0)
                } else {
                    None
                }
            }
        }
    }

    /// What `previous()` would return, without mutating anything
    pub fn peek_previous(&self) -> Option<usize> {
        let cursor = self.cursor?;
        match self.shuffle {
            ShuffleMode::On => self.shuffle_sequence.peek_previous(),
            ShuffleMode::Off => {
                if cursor > 0 {
                    Some(cursor - 1)
                } else if self.repeat == RepeatMode::All {
                    Some(self.size - 1)
                } else {
                    None
                }
            }
        }
    }

    // ===== Modes =====

    /// Set the repeat mode
    ///
    /// Repeat One turns shuffle off. Returns the resulting modes.
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> (RepeatMode, ShuffleMode) {
        self.repeat = mode;
        if mode == RepeatMode::One && self.shuffle == ShuffleMode::On {
            self.shuffle = ShuffleMode::Off;
            self.shuffle_sequence.clear();
        }
        (self.repeat, self.shuffle)
    }

    /// Cycle Off -> One -> All -> Off
    pub fn toggle_repeat_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        self.set_repeat_mode(self.repeat.toggled())
    }

    /// Set the shuffle mode
    ///
    /// Turning shuffle on pins the current index as already played and
    /// moves repeat One to repeat All. Returns the resulting modes.
    pub fn set_shuffle_mode(&mut self, mode: ShuffleMode) -> (RepeatMode, ShuffleMode) {
        if mode == self.shuffle {
            return (self.repeat, self.shuffle);
        }

        self.shuffle = mode;
        match mode {
            ShuffleMode::On => {
                if self.repeat == RepeatMode::One {
                    self.repeat = RepeatMode::All;
                }
                self.shuffle_sequence.reset(self.size, self.cursor);
            }
            ShuffleMode::Off => self.shuffle_sequence.clear(),
        }
        (self.repeat, self.shuffle)
    }

    /// Flip shuffle on or off
    pub fn toggle_shuffle_mode(&mut self) -> (RepeatMode, ShuffleMode) {
        self.set_shuffle_mode(self.shuffle.toggled())
    }

    /// Carry the sequence over to a reshaped scope
    ///
    /// `cursor` is the relocated current index; shuffle state is translated
    /// through `map` (see [`ShuffleSequence::remap`]).
    pub fn remap(
        &mut self,
        new_size: usize,
        cursor: Option<usize>,
        map: impl Fn(usize) -> Option<usize>,
        added: &[usize],
    ) {
        self.size = new_size;
        self.cursor = cursor.filter(|&i| i < new_size);

        if self.shuffle == ShuffleMode::On {
            self.shuffle_sequence.remap(new_size, map, added);
            if let Some(cursor) = self.cursor {
                if self.shuffle_sequence.current() != Some(cursor) {
                    self.shuffle_sequence.select(cursor);
                }
            }
        }
    }
}

impl Default for PlaybackSequence {
    fn default() -> Self {
        Self::new(50)
    }
}
