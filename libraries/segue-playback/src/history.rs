//! Shuffle history tracking
//!
//! Maintains a bounded history of played scope indices for "previous"
//! navigation while shuffling

use std::collections::VecDeque;

/// Played indices with bounded size
///
/// Implements a ring buffer that automatically discards oldest entries.
/// The most recent entry is the index currently playing.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    indices: VecDeque<usize>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size (at least 1)
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            indices: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Add index to history
    ///
    /// If history is full, oldest entry is discarded
    pub fn push(&mut self, index: usize) {
        if self.indices.len() >= self.max_size {
            self.indices.pop_front();
        }
        self.indices.push_back(index);
    }

    /// Most recent index (without removing)
    pub fn peek(&self) -> Option<usize> {
        self.indices.back().copied()
    }

    /// Index played before the most recent one
    pub fn peek_previous(&self) -> Option<usize> {
        let len = self.indices.len();
        if len < 2 {
            return None;
        }
        self.indices.get(len - 2).copied()
    }

    /// Pop most recent index
    pub fn pop(&mut self) -> Option<usize> {
        self.indices.pop_back()
    }

    /// Remove an index wherever it is; returns whether it was present
    pub fn remove(&mut self, index: usize) -> bool {
        match self.indices.iter().position(|&i| i == index) {
            Some(position) => {
                self.indices.remove(position);
                true
            }
            None => false,
        }
    }

    /// Rewrite every entry, dropping those that map to `None`
    pub fn remap(&mut self, map: impl Fn(usize) -> Option<usize>) {
        self.indices = self.indices.iter().filter_map(|&i| map(i)).collect();
    }

    /// All indices (oldest first)
    pub fn get_all(&self) -> Vec<usize> {
        self.indices.iter().copied().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Get maximum history size
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50) // Default: 50 entries
    }
}
