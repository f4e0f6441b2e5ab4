//! Fixed-capacity recency buffer with majority and unanimity queries.
//!
//! Holds the most recent `capacity` labels, newest first. Pushing into a full
//! buffer drops the single oldest label.

use crate::error::{RepTrackError, Result};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Ring buffer of discrete labels used as a debounce window.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Front is the most recently pushed label.
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T: Eq + Hash> RingBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` labels.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RepTrackError::ConfigInvalidValue {
                key: "ring_buffer.capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Inserts `label` as the newest entry, evicting the oldest if full.
    pub fn push(&mut self, label: T) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(label);
    }

    /// Label with the highest count, or `None` when empty.
    ///
    /// Ties go to the tied label seen first walking newest to oldest, i.e.
    /// the one pushed most recently.
    pub fn majority(&self) -> Option<&T> {
        let mut counts: HashMap<&T, usize> = HashMap::new();
        for label in &self.entries {
            *counts.entry(label).or_insert(0) += 1;
        }

        let mut best: Option<(&T, usize)> = None;
        for label in &self.entries {
            let count = counts.get(label).copied().unwrap_or(0);
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((label, count)),
            }
        }
        best.map(|(label, _)| label)
    }

    /// True iff the buffer is non-empty and every entry equals `label`.
    ///
    /// An empty buffer is never unanimous: no observations, no consensus.
    pub fn is_unanimous(&self, label: &T) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|entry| entry == label)
    }

    /// Most recently pushed label.
    pub fn latest(&self) -> Option<&T> {
        self.entries.front()
    }

    /// Number of entries equal to `label`.
    pub fn count(&self, label: &T) -> usize {
        self.entries.iter().filter(|entry| *entry == label).count()
    }

    /// Entries newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
