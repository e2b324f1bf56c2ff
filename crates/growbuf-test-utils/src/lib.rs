//! Test utilities and instrumented allocators for growbuf development.
//!
//! [`TrackingAllocator`] keeps a ledger of every live extent so tests can
//! check that each extent is released exactly once, and can be scripted to
//! refuse allocations. [`fixtures`] builds recognisable byte patterns.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::{Cell, RefCell};

use growbuf_core::{Allocator, Extent};
use indexmap::IndexMap;

/// Byte written into every fresh extent, so code that forgets to
/// initialise memory reads something other than zero.
pub const POISON: u8 = 0xA5;

/// Allocator that records live extents and counts traffic.
///
/// Extents are keyed by address in an `IndexMap`, which keeps
/// [`live_extents`](TrackingAllocator::live_extents) in allocation order.
/// Freeing an extent the ledger does not know about panics.
pub struct TrackingAllocator {
    live: RefCell<IndexMap<usize, usize>>,
    allocations: Cell<usize>,
    frees: Cell<usize>,
    refused: Cell<usize>,
    /// Allocation number (0-based) from which requests are refused.
    fail_from: Cell<Option<usize>>,
}

impl TrackingAllocator {
    pub fn new() -> Self {
        Self {
            live: RefCell::new(IndexMap::new()),
            allocations: Cell::new(0),
            frees: Cell::new(0),
            refused: Cell::new(0),
            fail_from: Cell::new(None),
        }
    }

    /// An allocator that serves `succeed_count` requests and refuses the rest.
    pub fn failing_after(succeed_count: usize) -> Self {
        let alloc = Self::new();
        alloc.fail_from.set(Some(succeed_count));
        alloc
    }

    /// Refuse every request from now on.
    pub fn fail_from_now(&self) {
        self.fail_from.set(Some(self.allocations.get()));
    }

    /// Serve every request again.
    pub fn allow_all(&self) {
        self.fail_from.set(None);
    }

    /// Number of successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Number of extents returned through `free`.
    pub fn frees(&self) -> usize {
        self.frees.get()
    }

    /// Number of refused requests.
    pub fn refused(&self) -> usize {
        self.refused.get()
    }

    /// Number of non-empty extents currently handed out.
    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Total bytes of all live extents.
    pub fn live_bytes(&self) -> usize {
        self.live.borrow().values().sum()
    }

    /// `(address, size)` of each live extent, oldest first.
    pub fn live_extents(&self) -> Vec<(usize, usize)> {
        self.live.borrow().iter().map(|(&a, &s)| (a, s)).collect()
    }

    /// Whether the extent at `addr` is currently handed out.
    pub fn is_live(&self, addr: usize) -> bool {
        self.live.borrow().contains_key(&addr)
    }
}

impl Default for TrackingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for TrackingAllocator {
    fn allocate(&self, size: usize) -> Option<Extent> {
        if let Some(limit) = self.fail_from.get() {
            if self.allocations.get() >= limit {
                self.refused.set(self.refused.get() + 1);
                return None;
            }
        }
        let Some(mut extent) = Extent::try_zeroed(size) else {
            self.refused.set(self.refused.get() + 1);
            return None;
        };
        extent.as_bytes_mut().fill(POISON);
        self.allocations.set(self.allocations.get() + 1);
        // Zero-sized extents share a dangling address; only real ones are keyed.
        if !extent.is_empty() {
            self.live.borrow_mut().insert(extent.addr(), size);
        }
        Some(extent)
    }

    fn free(&self, extent: Extent) {
        if !extent.is_empty() {
            let removed = self.live.borrow_mut().shift_remove(&extent.addr());
            assert!(
                removed.is_some(),
                "freed an extent this allocator does not own: {extent:?}"
            );
        }
        self.frees.set(self.frees.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_live_extents() {
        let alloc = TrackingAllocator::new();
        let a = alloc.allocate(16).unwrap();
        let b = alloc.allocate(8).unwrap();
        assert_eq!(alloc.live_count(), 2);
        assert_eq!(alloc.live_bytes(), 24);
        assert_eq!(alloc.live_extents()[0], (a.addr(), 16));
        alloc.free(a);
        assert_eq!(alloc.live_extents(), vec![(b.addr(), 8)]);
        alloc.free(b);
        assert_eq!(alloc.live_count(), 0);
        assert_eq!(alloc.frees(), 2);
    }

    #[test]
    fn fresh_extents_are_poisoned() {
        let alloc = TrackingAllocator::new();
        let extent = alloc.allocate(4).unwrap();
        assert_eq!(extent.as_bytes(), &[POISON; 4]);
        alloc.free(extent);
    }

    #[test]
    fn failing_after_refuses_later_requests() {
        let alloc = TrackingAllocator::failing_after(1);
        let first = alloc.allocate(4).unwrap();
        assert!(alloc.allocate(4).is_none());
        assert_eq!(alloc.refused(), 1);
        alloc.allow_all();
        let second = alloc.allocate(4).unwrap();
        alloc.free(first);
        alloc.free(second);
    }

    #[test]
    fn fail_from_now_refuses_immediately() {
        let alloc = TrackingAllocator::new();
        alloc.fail_from_now();
        assert!(alloc.allocate(1).is_none());
        assert_eq!(alloc.allocations(), 0);
    }

    #[test]
    #[should_panic(expected = "does not own")]
    fn foreign_free_panics() {
        let alloc = TrackingAllocator::new();
        alloc.free(Extent::try_zeroed(4).unwrap());
    }
}
