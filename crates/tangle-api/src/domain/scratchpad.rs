//! Shared visited-set for graph walks.
//!
//! One bit per store pointer. A walk takes the lock for its whole duration,
//! so at most one traversal runs at a time and the bitset is reused rather
//! than reallocated.

use bitvec::prelude::*;
use parking_lot::{Mutex, MutexGuard};
use tangle_storage::Pointer;

/// Bitset over pointers, reset on every acquisition.
#[derive(Debug, Default)]
pub struct VisitedScratchpad {
    bits: Mutex<BitVec<u64, Lsb0>>,
}

impl VisitedScratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the scratchpad, cleared and sized for pointers `0..=range`.
    ///
    /// Blocks while another walk holds it.
    pub fn acquire(&self, range: u64) -> VisitedGuard<'_> {
        let mut bits = self.bits.lock();
        let len = range as usize + 1;
        bits.clear();
        bits.resize(len, false);
        VisitedGuard { bits }
    }
}

/// Exclusive handle on the visited bits for one walk.
pub struct VisitedGuard<'a> {
    bits: MutexGuard<'a, BitVec<u64, Lsb0>>,
}

impl VisitedGuard<'_> {
    /// Mark `pointer` visited. Returns `true` if it was not visited before.
    ///
    /// Pointers allocated after the walk began grow the bitset.
    pub fn mark(&mut self, pointer: Pointer) -> bool {
        let index = pointer.get() as usize;
        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }
        !self.bits.replace(index, true)
    }

    pub fn is_visited(&self, pointer: Pointer) -> bool {
        self.bits
            .get(pointer.get() as usize)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    /// Number of pointers marked so far.
    pub fn visited_count(&self) -> usize {
        self.bits.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_reports_first_visit() {
        let pad = VisitedScratchpad::new();
        let mut guard = pad.acquire(8);
        assert!(guard.mark(Pointer::new(3)));
        assert!(!guard.mark(Pointer::new(3)));
        assert!(guard.is_visited(Pointer::new(3)));
        assert!(!guard.is_visited(Pointer::new(4)));
        assert_eq!(guard.visited_count(), 1);
    }

    #[test]
    fn test_reacquire_resets() {
        let pad = VisitedScratchpad::new();
        {
            let mut guard = pad.acquire(4);
            guard.mark(Pointer::new(1));
            guard.mark(Pointer::new(2));
        }
        let guard = pad.acquire(4);
        assert_eq!(guard.visited_count(), 0);
        assert_eq!(pad_len(&guard), 5);
    }

    #[test]
    fn test_grows_past_initial_range() {
        let pad = VisitedScratchpad::new();
        let mut guard = pad.acquire(2);
        assert!(guard.mark(Pointer::new(100)));
        assert!(guard.is_visited(Pointer::new(100)));
    }

    #[test]
    fn test_walks_are_serialized() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let pad = VisitedScratchpad::new();
        let active = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let _guard = pad.acquire(16);
                        assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });
    }

    fn pad_len(guard: &VisitedGuard<'_>) -> usize {
        guard.bits.len()
    }
}
