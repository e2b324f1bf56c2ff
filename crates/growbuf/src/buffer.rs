//! Growable buffers built on [`Storage`].
//!
//! [`Buffer`] adds one operation to its storage: [`grow`](Buffer::grow),
//! which guarantees room for a number of elements and migrates the live
//! elements whenever the extent has to be replaced.

use std::fmt;
use std::ops::{Deref, DerefMut};

use growbuf_core::{Allocator, BufferError, GrowthPolicy, HeapAllocator};
use tracing::trace;

use crate::raw;
use crate::storage::Storage;

/// A [`Storage`] with an amortised-O(1) growth operation.
///
/// Dereferences to its storage, so every storage operation is available
/// directly on the buffer.
pub struct Buffer<A: Allocator = HeapAllocator> {
    storage: Storage<A>,
}

impl Buffer<HeapAllocator> {
    /// An empty buffer on the global heap with the default growth policy.
    pub fn on_heap() -> Self {
        Self::new(HeapAllocator)
    }
}

impl Default for Buffer<HeapAllocator> {
    fn default() -> Self {
        Self::on_heap()
    }
}

impl<A: Allocator> Buffer<A> {
    /// Create an empty buffer bound to `allocator`.
    pub fn new(allocator: A) -> Self {
        Self::from_storage(Storage::new(allocator))
    }

    /// Create an empty buffer with a custom growth policy.
    pub fn with_policy(allocator: A, policy: GrowthPolicy) -> Self {
        Self::from_storage(Storage::with_policy(allocator, policy))
    }

    /// Wrap an existing storage.
    pub fn from_storage(storage: Storage<A>) -> Self {
        Self { storage }
    }

    /// Build a buffer holding a tight copy of `other`'s in-use elements.
    ///
    /// See [`Storage::copy_from`].
    pub fn try_clone_from<B: Allocator>(
        other: &Storage<B>,
        element_size: usize,
        allocator: A,
    ) -> Result<Self, BufferError> {
        let mut storage = Storage::new(allocator);
        storage.copy_from(other, element_size)?;
        Ok(Self { storage })
    }

    /// Unwrap into the underlying storage.
    pub fn into_storage(self) -> Storage<A> {
        self.storage
    }

    /// The underlying storage.
    pub fn as_storage(&self) -> &Storage<A> {
        &self.storage
    }

    /// The underlying storage, mutably.
    pub fn as_storage_mut(&mut self) -> &mut Storage<A> {
        &mut self.storage
    }

    /// Make room for `new_length` elements and raise `length` to it.
    ///
    /// If `new_length` already fits in the current capacity nothing is
    /// reallocated and `Ok(false)` is returned; `length` is raised to
    /// `new_length` when that is larger, and never lowered.
    ///
    /// Otherwise the storage expands through its growth policy, the first
    /// `length` elements are copied into the new extent, the old extent is
    /// freed, elements `[length, new_length)` are zeroed, and `Ok(true)` is
    /// returned. On error the buffer is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `element_size` is zero.
    pub fn grow(&mut self, element_size: usize, new_length: u32) -> Result<bool, BufferError> {
        let old_length = self.storage.length();
        let reallocate = new_length > self.storage.length_max();

        if reallocate {
            let old = self.storage.expand(element_size, new_length)?;
            assert!(
                new_length <= self.storage.length_max(),
                "expansion to {} did not reach {new_length}",
                self.storage.length_max()
            );

            let bytes = self.storage.extent_bytes_mut();
            if let Some(old) = &old {
                raw::copy_elements(bytes, old.as_bytes(), old_length, element_size);
            }
            raw::zero_elements(bytes, old_length, new_length, element_size);
            if let Some(old) = old {
                self.storage.allocator().free(old);
            }
        } else {
            trace!(
                new_length,
                capacity = self.storage.length_max(),
                "grow within capacity"
            );
        }

        if new_length > old_length {
            self.storage.set_length(new_length);
        }
        Ok(reallocate)
    }
}

impl<A: Allocator> Deref for Buffer<A> {
    type Target = Storage<A>;

    fn deref(&self) -> &Storage<A> {
        &self.storage
    }
}

impl<A: Allocator> DerefMut for Buffer<A> {
    fn deref_mut(&mut self) -> &mut Storage<A> {
        &mut self.storage
    }
}

impl<A: Allocator> fmt::Debug for Buffer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Buffer").field(&self.storage).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growbuf_test_utils::fixtures::{fill_pattern, pattern};
    use growbuf_test_utils::{TrackingAllocator, POISON};
    use proptest::prelude::*;

    #[test]
    fn growth_curve_from_empty() {
        let mut buf = Buffer::on_heap();
        let steps = [(1, 8), (9, 18), (19, 38), (39, 78), (79, 143)];
        for (required, capacity) in steps {
            assert!(buf.grow(4, required).unwrap());
            assert_eq!(buf.length_max(), capacity, "after requiring {required}");
            assert_eq!(buf.length(), required);
        }
    }

    #[test]
    fn grow_within_capacity_does_not_reallocate() {
        let alloc = TrackingAllocator::new();
        let mut buf = Buffer::new(&alloc);
        buf.grow(2, 3).unwrap();
        assert_eq!(alloc.allocations(), 1);

        assert!(!buf.grow(2, 8).unwrap());
        assert_eq!(buf.length(), 8);
        assert_eq!(alloc.allocations(), 1);
    }

    #[test]
    fn grow_never_lowers_length() {
        let mut buf = Buffer::on_heap();
        buf.grow(1, 6).unwrap();
        assert!(!buf.grow(1, 2).unwrap());
        assert_eq!(buf.length(), 6);
    }

    #[test]
    fn reallocating_grow_preserves_and_zero_fills() {
        let alloc = TrackingAllocator::new();
        let mut buf = Buffer::new(&alloc);
        buf.grow(3, 8).unwrap();
        fill_pattern(buf.bytes_mut(3), 3);

        assert_eq!(buf.length_max(), 16);

        assert!(buf.grow(3, 17).unwrap());
        assert_eq!(buf.length_max(), 34);
        let bytes = buf.bytes(3);
        assert_eq!(&bytes[..24], pattern(8, 3).as_slice());
        assert!(bytes[24..].iter().all(|&b| b == 0));
        // Slack past the new length is left as the allocator provided it.
        assert!(buf.extent_bytes()[51..].iter().all(|&b| b == POISON));
    }

    #[test]
    fn reallocating_grow_frees_the_old_extent() {
        let alloc = TrackingAllocator::new();
        {
            let mut buf = Buffer::new(&alloc);
            buf.grow(8, 1).unwrap();
            buf.grow(8, 9).unwrap();
            buf.grow(8, 19).unwrap();
            assert_eq!(alloc.allocations(), 3);
            assert_eq!(alloc.frees(), 2);
            assert_eq!(alloc.live_bytes(), 38 * 8);
        }
        assert_eq!(alloc.live_count(), 0);
    }

    #[test]
    fn grow_failure_leaves_buffer_intact() {
        let alloc = TrackingAllocator::failing_after(1);
        let mut buf = Buffer::new(&alloc);
        buf.grow(1, 8).unwrap();
        fill_pattern(buf.bytes_mut(1), 1);

        let err = buf.grow(1, 17).unwrap_err();
        assert_eq!(err, BufferError::AllocationFailed { requested: 34 });
        assert_eq!(buf.length(), 8);
        assert_eq!(buf.length_max(), 16);
        assert_eq!(buf.bytes(1), pattern(8, 1).as_slice());
    }

    #[test]
    fn preallocated_buffer_grows_in_place() {
        let mut buf = Buffer::on_heap();
        buf.preallocate(100, 4).unwrap();
        assert!(!buf.grow(4, 100).unwrap());
        assert_eq!(buf.length_max(), 100);
        assert!(buf.grow(4, 101).unwrap());
        assert_eq!(buf.length_max(), 165);
    }

    #[test]
    fn insert_via_grow_and_shift() {
        let mut buf = Buffer::on_heap();
        buf.grow(1, 4).unwrap();
        buf.bytes_mut(1).copy_from_slice(&[1, 2, 4, 5]);

        // Insert 3 at index 2.
        let len = buf.length();
        buf.grow(1, len + 1).unwrap();
        buf.set_length(len);
        buf.shift_mem(2, 1, 1);
        buf.set_length(len + 1);
        buf.element_mut(2, 1).unwrap()[0] = 3;
        assert_eq!(buf.bytes(1), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn clone_from_storage_is_tight() {
        let mut src = Buffer::on_heap();
        src.grow(2, 5).unwrap();
        fill_pattern(src.bytes_mut(2), 2);

        let copy = Buffer::try_clone_from(src.as_storage(), 2, HeapAllocator).unwrap();
        assert_eq!(copy.length(), 5);
        assert_eq!(copy.length_max(), 5);
        assert_eq!(copy.bytes(2), src.bytes(2));
    }

    #[test]
    fn clone_from_reports_allocation_failure() {
        let mut src = Buffer::on_heap();
        src.grow(2, 5).unwrap();
        let alloc = TrackingAllocator::failing_after(0);
        let err = Buffer::try_clone_from(src.as_storage(), 2, &alloc).unwrap_err();
        assert_eq!(err, BufferError::AllocationFailed { requested: 10 });
    }

    #[test]
    fn into_storage_keeps_contents() {
        let mut buf = Buffer::on_heap();
        buf.grow(1, 3).unwrap();
        buf.bytes_mut(1).copy_from_slice(&[9, 8, 7]);
        let storage = buf.into_storage();
        assert_eq!(storage.bytes(1), &[9, 8, 7]);
    }

    // ── Property tests ──────────────────────────────────────────

    proptest! {
        #[test]
        fn grow_preserves_prefix_and_zeroes_tail(
            element_size in 1usize..9,
            lengths in prop::collection::vec(0u32..300, 1..12),
        ) {
            let alloc = TrackingAllocator::new();
            let mut buf = Buffer::new(&alloc);
            for new_length in lengths {
                let old_length = buf.length();
                let before = buf.bytes(element_size).to_vec();
                let reallocated = buf.grow(element_size, new_length).unwrap();

                prop_assert_eq!(buf.length(), old_length.max(new_length));
                prop_assert!(buf.length_max() >= buf.length());
                let after = buf.bytes(element_size);
                prop_assert_eq!(&after[..before.len()], before.as_slice());
                if reallocated {
                    prop_assert!(after[before.len()..].iter().all(|&b| b == 0));
                }
                // Mark live data so the next step can tell it apart from zero-fill.
                fill_pattern(buf.bytes_mut(element_size), element_size);
            }
            drop(buf);
            prop_assert_eq!(alloc.live_count(), 0);
        }
    }
}
