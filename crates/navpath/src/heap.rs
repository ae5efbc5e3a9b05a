//! A min-heap over [`BinaryHeap`], which on its own pops the largest element first.

use std::{cmp::Reverse, collections::BinaryHeap};

/// A binary min-heap. The smallest element according to [`Ord`] is popped first.
/// Equal elements are popped in an unspecified order.
///
/// Entries that are not naturally ordered, like floating point scores, implement [`Ord`]
/// on a wrapper type, e.g. through [`f32::total_cmp`].
#[derive(Debug, Clone)]
pub struct PriorityQueue<T: Ord> {
    heap: BinaryHeap<Reverse<T>>,
}

impl<T: Ord> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> PriorityQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Creates an empty queue with room for `capacity` elements.
    /// The queue grows beyond the capacity if needed.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Inserts an element in `O(log n)`.
    #[inline]
    pub fn push(&mut self, item: T) {
        self.heap.push(Reverse(item));
    }

    /// Removes and returns the smallest element in `O(log n)`.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|Reverse(item)| item)
    }

    /// Returns the smallest element without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|Reverse(item)| item)
    }

    /// The number of queued elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes all elements, keeping the allocation.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
