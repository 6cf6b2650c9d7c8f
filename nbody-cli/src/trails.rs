//! Rendering-only position history, kept apart from the physics bodies
//!
//! Trails are keyed by body index, so the integrator's bodies never carry
//! any display state.

use glam::DVec3;
use std::collections::VecDeque;

pub struct Trails {
    max_len: usize,
    per_body: Vec<VecDeque<DVec3>>,
}

impl Trails {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            per_body: Vec::new(),
        }
    }

    /// Append one position per body, dropping the oldest beyond `max_len`.
    ///
    /// The body count may differ from the previous frame after a reload, in
    /// which case the buffers are resized to match.
    pub fn record(&mut self, positions: impl IntoIterator<Item = DVec3>) {
        let mut count = 0;
        for (i, pos) in positions.into_iter().enumerate() {
            if i >= self.per_body.len() {
                self.per_body.push(VecDeque::with_capacity(self.max_len));
            }
            let trail = &mut self.per_body[i];
            trail.push_back(pos);
            while trail.len() > self.max_len {
                trail.pop_front();
            }
            count = i + 1;
        }
        self.per_body.truncate(count);
    }

    /// Oldest to newest positions of the body at `index`
    pub fn points(&self, index: usize) -> impl Iterator<Item = DVec3> + '_ {
        self.per_body.get(index).into_iter().flatten().copied()
    }

    pub fn len(&self, index: usize) -> usize {
        self.per_body.get(index).map_or(0, VecDeque::len)
    }

    pub fn clear(&mut self) {
        self.per_body.clear();
    }

    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
        for trail in &mut self.per_body {
            while trail.len() > max_len {
                trail.pop_front();
            }
        }
    }
}
