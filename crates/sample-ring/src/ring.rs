//! Overwrite-Oldest Ring Implementation

use std::time::{Duration, Instant};

use crate::Sample;

/// Fixed-capacity circular buffer of the most recent samples
///
/// Seeded with one sample at construction so that [`SampleRing::current`] is
/// always defined. Once full, each push overwrites the oldest slot in
/// circular order. The ring itself is not synchronized; the producer and any
/// status readers share it behind one lock so a reader never observes a
/// sample whose label and value belong to different updates.
#[derive(Debug)]
pub struct SampleRing {
    slots: Vec<Sample>,
    capacity: usize,
    current: usize,
    last_updated: Instant,
}

impl SampleRing {
    /// Create a ring holding at most `capacity` samples, seeded with one
    ///
    /// Panics if `capacity` is zero; a ring that can hold nothing cannot
    /// satisfy the `current()` contract.
    pub fn new(capacity: usize, seed: Sample) -> Self {
        assert!(capacity > 0, "ring capacity must be at least 1");
        let mut slots = Vec::with_capacity(capacity);
        slots.push(seed);
        Self {
            slots,
            capacity,
            current: 0,
            last_updated: Instant::now(),
        }
    }

    /// Insert a sample, overwriting the oldest slot once full
    ///
    /// Updates the last-updated timestamp exactly once per call.
    pub fn push(&mut self, sample: Sample) {
        if self.slots.len() < self.capacity {
            self.slots.push(sample);
            self.current = self.slots.len() - 1;
        } else {
            self.current = (self.current + 1) % self.capacity;
            self.slots[self.current] = sample;
        }
        self.last_updated = Instant::now();
    }

    /// The most recently pushed sample (the seed before any push)
    pub fn current(&self) -> &Sample {
        &self.slots[self.current]
    }

    /// Number of samples currently retained; never exceeds capacity and
    /// never shrinks once full
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: the ring is seeded at construction
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of retained samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Instant of the last push (construction time before any push)
    pub fn last_updated(&self) -> Instant {
        self.last_updated
    }

    /// Whether the latest sample is older than `threshold` at `now`
    ///
    /// Strict comparison: an age of exactly `threshold` is not stale.
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        now.saturating_duration_since(self.last_updated) > threshold
    }

    /// Retained samples, newest first
    pub fn recent(&self) -> Vec<Sample> {
        let len = self.slots.len();
        (0..len)
            .map(|k| self.slots[(self.current + len - k) % len].clone())
            .collect()
    }
}
