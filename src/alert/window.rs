//! Window module - Fixed-capacity rolling buffer over the most recent samples

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    buf: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, buf: VecDeque::with_capacity(capacity) }
    }

    /// Appends `x`, evicting the oldest sample once full.
    pub fn push(&mut self, x: f64) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(x);
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn all_at_least(&self, threshold: f64) -> bool {
        self.buf.iter().all(|v| *v >= threshold)
    }

    /// Largest absolute difference between neighbouring samples.
    pub fn max_step(&self) -> Option<f64> {
        self.buf
            .iter()
            .zip(self.buf.iter().skip(1))
            .map(|(a, b)| (b - a).abs())
            .reduce(f64::max)
    }
}
