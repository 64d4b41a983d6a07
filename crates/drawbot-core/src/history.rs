//! Linear undo/redo history over drawing snapshots.

use crate::command::DrawingData;
use std::collections::VecDeque;

/// Timeline of immutable drawing snapshots.
///
/// `past` runs oldest to newest, `future` runs nearest to farthest. Every
/// transition moves whole snapshots between the three slots; nothing is ever
/// edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    past: VecDeque<DrawingData>,
    present: DrawingData,
    future: VecDeque<DrawingData>,
    /// Maximum number of undo states to keep (`None` = unbounded).
    capacity: Option<usize>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DrawingData::empty())
    }
}

impl History {
    /// Create an unbounded history starting at `present`.
    pub fn new(present: DrawingData) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: VecDeque::new(),
            capacity: None,
        }
    }

    /// Create a history that keeps at most `capacity` undo states.
    ///
    /// The oldest states are dropped first. A capacity of zero disables undo.
    pub fn with_capacity(present: DrawingData, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(present)
        }
    }

    /// The currently displayed drawing.
    pub fn present(&self) -> &DrawingData {
        &self.present
    }

    /// Undo states, oldest first.
    pub fn past(&self) -> impl ExactSizeIterator<Item = &DrawingData> + DoubleEndedIterator {
        self.past.iter()
    }

    /// Redo states, nearest first.
    pub fn future(&self) -> impl ExactSizeIterator<Item = &DrawingData> + DoubleEndedIterator {
        self.future.iter()
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Make `next` the present drawing, discarding any redo states.
    pub fn push(&mut self, next: DrawingData) {
        let previous = std::mem::replace(&mut self.present, next);
        self.past.push_back(previous);
        self.future.clear();
        self.enforce_capacity();
    }

    /// Step back one snapshot.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        true
    }

    /// Step forward one snapshot.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = std::mem::replace(&mut self.present, next);
        self.past.push_back(current);
        self.enforce_capacity();
        true
    }

    /// Start a new editing session at `next`.
    ///
    /// The prior drawing stays reachable as the single undo state; everything
    /// else in the timeline is dropped.
    pub fn reset(&mut self, next: DrawingData) {
        self.past.clear();
        self.future.clear();
        self.push(next);
    }

    fn enforce_capacity(&mut self) {
        if let Some(capacity) = self.capacity {
            while self.past.len() > capacity {
                self.past.pop_front();
            }
        }
    }
}
