//! Majority-vote smoothing of per-frame motion gesture ids.

use crate::tracker::RingBuffer;

/// Motion id meaning "no finger gesture".
pub const NO_MOTION: usize = 0;

/// Most frequent id in iteration order; on a tie the id encountered first
/// wins. `None` for an empty window.
pub fn majority_vote<I>(ids: I) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    // (id, count) in first-seen order
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for id in ids {
        match counts.iter_mut().find(|(seen, _)| *seen == id) {
            Some((_, n)) => *n += 1,
            None => counts.push((id, 1)),
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (id, n) in counts {
        if best.is_none_or(|(_, b)| n > b) {
            best = Some((id, n));
        }
    }
    best.map(|(id, _)| id)
}

/// Rolling window of raw motion ids with a voted output.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    ids: RingBuffer<usize>,
}

impl Stabilizer {
    pub fn new(window: usize) -> Self {
        Self {
            ids: RingBuffer::new(window),
        }
    }

    /// Records this frame's raw id and returns the voted id.
    pub fn push(&mut self, raw_id: usize) -> usize {
        self.ids.push(raw_id);
        self.current()
    }

    pub fn current(&self) -> usize {
        majority_vote(self.ids.iter()).unwrap_or(NO_MOTION)
    }

    pub fn ids(&self) -> &RingBuffer<usize> {
        &self.ids
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
