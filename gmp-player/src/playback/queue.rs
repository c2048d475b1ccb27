//! Pending track queue with positional edits
//!
//! Plain ordered sequence; the owning session guards it with its state lock
//! so every operation commits as one atomic step with respect to the player
//! loop. Positions exposed to callers are 1-based and refer to the snapshot
//! at the time of the call.

use crate::error::{Error, Result};
use crate::track::Track;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// FIFO of pending tracks (the currently playing track is not part of it)
#[derive(Debug, Clone, Default)]
pub struct TrackQueue {
    items: VecDeque<Track>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail; returns the 1-based position taken
    pub fn enqueue(&mut self, track: Track) -> usize {
        self.items.push_back(track);
        self.items.len()
    }

    /// Insert at the head ("play next", history restore)
    pub fn enqueue_front(&mut self, track: Track) {
        self.items.push_front(track);
    }

    /// Pop the head for the player loop
    pub fn pop_front(&mut self) -> Option<Track> {
        self.items.pop_front()
    }

    /// Remove and return the track at 1-based `position`
    pub fn remove(&mut self, position: usize) -> Result<Track> {
        position
            .checked_sub(1)
            .and_then(|index| self.items.remove(index))
            .ok_or_else(|| self.out_of_range(position))
    }

    /// Discard every track before 1-based `position`; returns the count dropped
    ///
    /// The caller is responsible for advancing playback so the new head
    /// becomes current.
    pub fn skip_to(&mut self, position: usize) -> Result<usize> {
        let index = self.index_of(position)?;
        self.items.drain(..index);
        Ok(index)
    }

    /// Uniformly permute pending tracks; returns the count shuffled
    pub fn shuffle(&mut self) -> usize {
        self.items
            .make_contiguous()
            .shuffle(&mut rand::thread_rng());
        self.items.len()
    }

    /// Drop all pending tracks; returns the count removed
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }

    /// Ordered copy for display
    pub fn snapshot(&self) -> Vec<Track> {
        self.items.iter().cloned().collect()
    }

    /// Labels of the first `limit` tracks
    pub fn preview(&self, limit: usize) -> Vec<String> {
        self.items
            .iter()
            .take(limit)
            .map(|t| t.label().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn index_of(&self, position: usize) -> Result<usize> {
        if position == 0 || position > self.items.len() {
            return Err(self.out_of_range(position));
        }
        Ok(position - 1)
    }

    fn out_of_range(&self, position: usize) -> Error {
        Error::OutOfRange {
            position: position as i64,
            len: self.items.len(),
        }
    }
}
