//! Bounded history of played tracks
//!
//! FIFO eviction at capacity, LIFO retrieval for "previous".

use crate::track::Track;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Track>,
    capacity: usize,
}

impl History {
    /// Create an empty history holding at most `capacity` (min 1) tracks
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a played track, evicting the oldest entry when full
    pub fn push(&mut self, track: Track) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(track);
    }

    /// Take the most recently pushed track
    pub fn pop(&mut self) -> Option<Track> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest-first
    pub fn snapshot(&self) -> Vec<Track> {
        self.entries.iter().cloned().collect()
    }
}
