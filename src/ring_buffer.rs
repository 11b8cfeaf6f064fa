//! Bounded per-channel sample history.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of display samples. The oldest sample is evicted
/// when a push would exceed capacity, so length never exceeds capacity and
/// insertion order always matches arrival order.
#[derive(Debug, Clone)]
pub struct SampleRing {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Copy of the most recent `max_count` samples in arrival order, fewer
    /// if the buffer is shorter.
    pub fn snapshot(&self, max_count: usize) -> Vec<f64> {
        let n = max_count.min(self.samples.len());
        self.samples
            .iter()
            .skip(self.samples.len() - n)
            .copied()
            .collect()
    }

    /// The two most recent samples, oldest first. `None` until two samples
    /// have arrived.
    pub fn last_two(&self) -> Option<(f64, f64)> {
        let len = self.samples.len();
        if len < 2 {
            return None;
        }
        Some((self.samples[len - 2], self.samples[len - 1]))
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_within_capacity() {
        let mut ring = SampleRing::new(4);
        ring.push(1.0);
        ring.push(2.0);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.snapshot(10), vec![1.0, 2.0]);
    }

    #[test]
    fn test_eviction_keeps_most_recent_in_order() {
        let mut ring = SampleRing::new(500);
        for i in 0..700 {
            ring.push(i as f64);
        }
        let snap = ring.snapshot(500);
        assert_eq!(snap.len(), 500);
        assert_eq!(snap[0], 200.0);
        assert_eq!(snap[499], 699.0);
        // Strictly increasing: arrival order preserved
        for w in snap.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_snapshot_shorter_than_request() {
        let mut ring = SampleRing::new(8);
        ring.push(5.0);
        assert_eq!(ring.snapshot(3), vec![5.0]);
    }

    #[test]
    fn test_snapshot_tail_only() {
        let mut ring = SampleRing::new(8);
        for i in 0..6 {
            ring.push(i as f64);
        }
        assert_eq!(ring.snapshot(2), vec![4.0, 5.0]);
    }

    #[test]
    fn test_last_two() {
        let mut ring = SampleRing::new(4);
        assert_eq!(ring.last_two(), None);
        ring.push(1.0);
        assert_eq!(ring.last_two(), None);
        ring.push(2.0);
        assert_eq!(ring.last_two(), Some((1.0, 2.0)));
        ring.push(3.0);
        assert_eq!(ring.last_two(), Some((2.0, 3.0)));
    }

    #[test]
    fn test_clear() {
        let mut ring = SampleRing::new(4);
        ring.push(1.0);
        ring.push(2.0);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.snapshot(4), Vec::<f64>::new());
        assert_eq!(ring.capacity(), 4);
    }
}
