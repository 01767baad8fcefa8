//! Bounded best-of-N tracker.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Keeps the `capacity` highest-scoring items seen so far.
///
/// Backed by a min-heap, so each push is O(log N) and the lowest score is
/// the one evicted. On equal scores the earlier item stays. Not safe to
/// share between concurrent writers; wrap it in a mutex if the driver
/// processes listings in parallel.
#[derive(Debug)]
pub struct TopNTracker<T> {
    capacity: usize,
    heap: BinaryHeap<Reverse<Entry<T>>>,
    pushed: u64,
}

#[derive(Debug)]
struct Entry<T> {
    score: f64,
    seq: u64,
    item: T,
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // later arrivals rank lower so they are evicted first on ties
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> TopNTracker<T> {
    /// Create a tracker holding at most `capacity` items
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
            pushed: 0,
        }
    }

    /// Offer an item; returns true if it is now among the best N
    pub fn push(&mut self, score: f64, item: T) -> bool {
        if self.capacity == 0 || score.is_nan() {
            return false;
        }

        let entry = Entry {
            score,
            seq: self.pushed,
            item,
        };
        self.pushed += 1;

        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(entry));
            return true;
        }

        let beats_worst = self
            .heap
            .peek()
            .is_some_and(|Reverse(worst)| entry > *worst);
        if beats_worst {
            self.heap.pop();
            self.heap.push(Reverse(entry));
        }
        beats_worst
    }

    /// Lowest score currently kept
    pub fn min_score(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(e)| e.score)
    }

    /// True once `capacity` items are held
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Number of items held
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True if nothing is held
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Maximum number of items held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items with their scores, highest first
    pub fn into_sorted(self) -> Vec<(f64, T)> {
        // ascending Reverse order is descending score order
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(e)| (e.score, e.item))
            .collect()
    }
}
