//! Per-hand tracking state: fingertip history and motion id window.

use crate::input::Point;
use crate::stabilizer::Stabilizer;

/// Default length of both rolling histories, in frames.
pub const DEFAULT_HISTORY_LENGTH: usize = 16;

/// Fixed-capacity FIFO. Slots are allocated up front and overwritten at the
/// write cursor once full, evicting the oldest entry.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    // next slot to overwrite once full; also the oldest entry
    cursor: usize,
}

impl<T: Copy> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    /// Appends `item`, returning the evicted entry when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        if !self.is_full() {
            self.slots.push(item);
            return None;
        }
        let evicted = std::mem::replace(&mut self.slots[self.cursor], item);
        self.cursor = (self.cursor + 1) % self.capacity;
        Some(evicted)
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer.iter()).copied()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Contents, oldest first, as they would be after `push(item)`.
    pub fn preview(&self, item: T) -> Vec<T> {
        let skip = usize::from(self.is_full());
        self.iter().skip(skip).chain(std::iter::once(item)).collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }
}

/// What one frame would do to a hand's state; applied with
/// [`HandTracker::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingUpdate {
    pub point: Point,
    pub raw_motion: usize,
}

/// History pair owned by one hand stream.
#[derive(Debug, Clone)]
pub struct HandTracker {
    points: RingBuffer<Point>,
    stabilizer: Stabilizer,
}

impl HandTracker {
    pub fn new(history_length: usize) -> Self {
        Self {
            points: RingBuffer::new(history_length),
            stabilizer: Stabilizer::new(history_length),
        }
    }

    /// Point history oldest first, sentinels included.
    pub fn points(&self) -> Vec<Point> {
        self.points.to_vec()
    }

    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }

    /// The trajectory window after pushing `point`, if it would be full.
    pub fn window_with(&self, point: Point) -> Option<Vec<Point>> {
        let window = self.points.preview(point);
        (window.len() == self.points.capacity()).then_some(window)
    }

    /// Pushes the frame's point and raw motion id; returns the voted id.
    pub fn commit(&mut self, update: PendingUpdate) -> usize {
        self.points.push(update.point);
        self.stabilizer.push(update.raw_motion)
    }

    /// Frame with no observation of this hand: keeps the point history
    /// aligned without touching the vote window.
    pub fn push_sentinel(&mut self) {
        self.points.push(Point::SENTINEL);
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.stabilizer.clear();
    }
}
