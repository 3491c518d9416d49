//! Shuffle sequence
//!
//! A shuffle pass is a random permutation of the scope indices. Indices are
//! popped from the unplayed remainder as playback advances and pushed onto a
//! bounded [`History`], whose most recent entry is the current track.
//! Stepping back returns the current index to the front of the remainder,
//! so stepping forward again replays the same order.

use crate::history::History;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use std::collections::VecDeque;

/// Shuffle state for one scope
#[derive(Debug, Clone)]
pub struct ShuffleSequence {
    /// Number of indices in the scope
    size: usize,

    /// Played indices of the current pass, current at the back
    history: History,

    /// Unplayed indices of the current pass, next first
    upcoming: VecDeque<usize>,
}

impl ShuffleSequence {
    /// Create an empty shuffle with a history bound
    pub fn new(history_size: usize) -> Self {
        Self {
            size: 0,
            history: History::new(history_size),
            upcoming: VecDeque::new(),
        }
    }

    /// Start a fresh pass over `size` indices
    ///
    /// `first`, when given and in range, is pinned as already played and
    /// becomes the current index.
    pub fn reset(&mut self, size: usize, first: Option<usize>) {
        self.size = size;
        self.history.clear();

        let first = first.filter(|&i| i < size);
        let mut order: Vec<usize> = (0..size).filter(|&i| Some(i) != first).collect();
        order.shuffle(&mut thread_rng());
        self.upcoming = order.into();

        if let Some(first) = first {
            self.history.push(first);
        }
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.size = 0;
        self.history.clear();
        self.upcoming.clear();
    }

    /// Number of indices in the scope
    pub fn size(&self) -> usize {
        self.size
    }

    /// Index currently playing
    pub fn current(&self) -> Option<usize> {
        self.history.peek()
    }

    /// Make `index` the current one, leaving the rest of the pass in order
    pub fn select(&mut self, index: usize) {
        if index >= self.size {
            return;
        }
        if let Some(position) = self.upcoming.iter().position(|&i| i == index) {
            self.upcoming.remove(position);
        } else {
            self.history.remove(index);
        }
        self.history.push(index);
    }

    /// Whether every index of the pass has been played
    pub fn is_exhausted(&self) -> bool {
        self.upcoming.is_empty()
    }

    /// Index the next [`advance`](Self::advance) would return
    pub fn peek_next(&self) -> Option<usize> {
        self.upcoming.front().copied()
    }

    /// Pop the next unplayed index and make it current
    pub fn advance(&mut self) -> Option<usize> {
        let next = self.upcoming.pop_front()?;
        self.history.push(next);
        Some(next)
    }

    /// Generate a new pass over every index
    ///
    /// When the scope has more than one index, `avoid` (normally the index
    /// that just finished) is kept away from the front so it doesn't play
    /// twice in a row.
    pub fn start_new_pass(&mut self, avoid: Option<usize>) {
        let mut rng = thread_rng();
        let mut order: Vec<usize> = (0..self.size).collect();
        order.shuffle(&mut rng);

        if order.len() > 1 && order.first().copied() == avoid {
            let swap_with = rng.gen_range(1..order.len());
            order.swap(0, swap_with);
        }

        self.history.clear();
        self.upcoming = order.into();
    }

    /// Index played before the current one
    pub fn peek_previous(&self) -> Option<usize> {
        self.history.peek_previous()
    }

    /// Step back in history
    ///
    /// The current index returns to the front of the unplayed remainder.
    pub fn retreat(&mut self) -> Option<usize> {
        self.history.peek_previous()?;
        if let Some(current) = self.history.pop() {
            self.upcoming.push_front(current);
        }
        self.history.peek()
    }

    /// Carry the pass over to a resized scope
    ///
    /// `map` translates an old index to its new position (`None` if the
    /// track left the scope). `added` are new indices with no old
    /// counterpart; each lands at a random spot of the unplayed remainder.
    pub fn remap(&mut self, new_size: usize, map: impl Fn(usize) -> Option<usize>, added: &[usize]) {
        self.size = new_size;
        self.history.remap(|i| map(i).filter(|&n| n < new_size));
        self.upcoming = self
            .upcoming
            .iter()
            .filter_map(|&i| map(i).filter(|&n| n < new_size))
            .collect();

        let mut rng = thread_rng();
        for &index in added.iter().filter(|&&i| i < new_size) {
            let at = rng.gen_range(0..=self.upcoming.len());
            self.upcoming.insert(at, index);
        }
    }

    /// Played indices of this pass, oldest first
    pub fn played(&self) -> Vec<usize> {
        self.history.get_all()
    }

    /// Unplayed indices of this pass, next first
    pub fn upcoming(&self) -> Vec<usize> {
        self.upcoming.iter().copied().collect()
    }
}
