//! Expiry Index Module
//!
//! Orders ids by the instant they are due to expire.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

// == Expiry Index ==
/// Min-heap of `(expire_at, id)`.
///
/// Overwriting an id pushes a second entry rather than updating the first, so
/// a popped entry may be stale. The store checks the live record before
/// deleting anything.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    heap: BinaryHeap<Reverse<(u64, String)>>,
}

impl ExpiryIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    // == Schedule ==
    /// Records that `id` is due to expire at `expire_at`.
    pub fn schedule(&mut self, id: &str, expire_at: u64) {
        self.heap.push(Reverse((expire_at, id.to_string())));
    }

    // == Pop Due ==
    /// Removes and returns the earliest entry if it is due at `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, String)> {
        match self.heap.peek() {
            Some(Reverse((expire_at, _))) if *expire_at <= now_ms => {
                self.heap.pop().map(|Reverse(entry)| entry)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
