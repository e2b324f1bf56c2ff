//! Raw extent storage with element-count bookkeeping.
//!
//! A [`Storage`] owns at most one [`Extent`] and tracks how many elements
//! it holds (`length_max`) and how many are in use (`length`). It never
//! interprets element contents: every operation takes the element size in
//! bytes from the caller.

use std::fmt;

use growbuf_core::{Allocator, BufferError, Extent, GrowthPolicy, HeapAllocator};
use tracing::{debug, trace, warn};

use crate::raw;

/// Exclusive owner of one raw byte extent.
///
/// Invariants:
/// - the extent is absent iff `length_max == 0`;
/// - `length <= length_max`;
/// - the extent is exactly `length_max * element_size` bytes for the
///   element size used to allocate it.
///
/// Dropping a storage returns its extent to the allocator.
pub struct Storage<A: Allocator = HeapAllocator> {
    raw: Option<Extent>,
    length: u32,
    length_max: u32,
    policy: GrowthPolicy,
    allocator: A,
}

impl Storage<HeapAllocator> {
    /// An empty storage on the global heap with the default growth policy.
    pub fn on_heap() -> Self {
        Self::new(HeapAllocator)
    }
}

impl Default for Storage<HeapAllocator> {
    fn default() -> Self {
        Self::on_heap()
    }
}

impl<A: Allocator> Storage<A> {
    /// Create an empty storage bound to `allocator`.
    pub fn new(allocator: A) -> Self {
        Self::with_policy(allocator, GrowthPolicy::DEFAULT)
    }

    /// Create an empty storage with a custom growth policy.
    pub fn with_policy(allocator: A, policy: GrowthPolicy) -> Self {
        Self {
            raw: None,
            length: 0,
            length_max: 0,
            policy,
            allocator,
        }
    }

    /// Allocate room for `length` elements up front.
    ///
    /// Leaves `length == 0` and `length_max == length`. The extent contents
    /// are whatever the allocator provides. No allocation happens for
    /// `length == 0`.
    ///
    /// # Panics
    ///
    /// Panics if the storage already owns an extent, or if `element_size`
    /// is zero.
    pub fn preallocate(&mut self, length: u32, element_size: usize) -> Result<(), BufferError> {
        assert!(
            self.raw.is_none(),
            "preallocate called on a storage that already owns an extent"
        );
        assert_element_size(element_size);

        if length > 0 {
            let extent = self.allocate_elements(length, element_size)?;
            debug!(capacity = length, bytes = extent.len(), "preallocated extent");
            self.raw = Some(extent);
        }
        self.length = 0;
        self.length_max = length;
        Ok(())
    }

    /// Replace the extent with a larger one sized by the growth policy.
    ///
    /// The new capacity is `policy.next_capacity(length_max, min_length)`.
    /// Nothing is copied and nothing is freed: the previous extent (if any)
    /// is returned to the caller, who must migrate the live elements out of
    /// it and hand it back to the allocator. Until then the first `length`
    /// elements of the new extent do not hold the storage's data.
    ///
    /// On error the storage is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `length > length_max` or `element_size` is zero.
    pub fn expand(
        &mut self,
        element_size: usize,
        min_length: u32,
    ) -> Result<Option<Extent>, BufferError> {
        assert!(
            self.length_max >= self.length,
            "storage length {} exceeds capacity {}",
            self.length,
            self.length_max
        );
        assert_element_size(element_size);

        let new_length_max = self
            .policy
            .next_capacity(self.length_max, min_length)
            .ok_or(BufferError::CapacityOverflow {
                elements: u64::from(self.length_max.max(min_length))
                    + u64::from(self.policy.max_increment()),
                element_size,
            })?;
        let extent = self.allocate_elements(new_length_max, element_size)?;
        debug!(
            old_capacity = self.length_max,
            new_capacity = new_length_max,
            bytes = extent.len(),
            "expanded storage extent"
        );
        self.length_max = new_length_max;
        Ok(self.raw.replace(extent))
    }

    /// Move elements `[index, length)` so they start at `index + shift_amount`.
    ///
    /// Ranges may overlap. `length` is not updated; follow up with
    /// [`set_length`](Self::set_length) once the gap is filled or closed.
    ///
    /// # Panics
    ///
    /// Panics if `length + shift_amount > length_max`,
    /// `index + shift_amount < 0`, or `index > length`.
    pub fn shift_mem(&mut self, index: u32, shift_amount: i32, element_size: usize) {
        let shifted_end = i64::from(self.length) + i64::from(shift_amount);
        assert!(
            shifted_end <= i64::from(self.length_max),
            "shift_mem: length {} shifted by {} exceeds capacity {}",
            self.length,
            shift_amount,
            self.length_max
        );
        let new_index = i64::from(index) + i64::from(shift_amount);
        assert!(
            new_index >= 0,
            "shift_mem: index {index} shifted by {shift_amount} is negative"
        );
        assert!(
            index <= self.length,
            "shift_mem: index {index} is past length {}",
            self.length
        );

        let count = self.length - index;
        if count == 0 || shift_amount == 0 {
            return;
        }
        trace!(index, shift_amount, count, "shifting elements");
        let extent = self
            .raw
            .as_mut()
            .expect("non-zero length implies an allocated extent");
        raw::move_elements(
            extent.as_bytes_mut(),
            index,
            new_index as u32,
            count,
            element_size,
        );
    }

    /// Become a tight copy of `other`'s in-use elements.
    ///
    /// Allocates exactly `other.length()` elements (no slack), copies them
    /// and returns the number of bytes copied. Copying an empty storage
    /// allocates nothing and returns 0. If allocation fails the storage
    /// stays empty and the error is returned.
    ///
    /// # Panics
    ///
    /// Panics if this storage already owns an extent, or if `element_size`
    /// is zero.
    pub fn copy_from<B: Allocator>(
        &mut self,
        other: &Storage<B>,
        element_size: usize,
    ) -> Result<usize, BufferError> {
        assert!(
            self.raw.is_none(),
            "copy_from requires a storage without an extent"
        );
        assert_element_size(element_size);

        let length = other.length;
        if length == 0 {
            return Ok(0);
        }
        let mut extent = self.allocate_elements(length, element_size)?;
        let src = other.bytes(element_size);
        extent.as_bytes_mut().copy_from_slice(src);
        debug!(capacity = length, bytes = src.len(), "copied storage");

        self.raw = Some(extent);
        self.length = length;
        self.length_max = length;
        Ok(src.len())
    }

    /// Number of elements in use.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Number of elements the extent can hold.
    pub fn length_max(&self) -> u32 {
        self.length_max
    }

    /// Whether no elements are in use.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether an extent is currently owned.
    pub fn has_extent(&self) -> bool {
        self.raw.is_some()
    }

    /// Set the number of in-use elements.
    ///
    /// Used after [`shift_mem`](Self::shift_mem) to commit an insertion or
    /// removal. Elements exposed by raising the length are not initialised.
    ///
    /// # Panics
    ///
    /// Panics if `new_length > length_max`.
    pub fn set_length(&mut self, new_length: u32) {
        assert!(
            new_length <= self.length_max,
            "length {new_length} exceeds capacity {}",
            self.length_max
        );
        self.length = new_length;
    }

    /// The in-use elements as bytes.
    ///
    /// # Panics
    ///
    /// Panics if `element_size` is larger than the one the extent was
    /// allocated with.
    pub fn bytes(&self, element_size: usize) -> &[u8] {
        match &self.raw {
            Some(extent) => &extent.as_bytes()[raw::element_range(0, self.length, element_size)],
            None => &[],
        }
    }

    /// The in-use elements as mutable bytes.
    ///
    /// # Panics
    ///
    /// Panics if `element_size` is larger than the one the extent was
    /// allocated with.
    pub fn bytes_mut(&mut self, element_size: usize) -> &mut [u8] {
        let range = raw::element_range(0, self.length, element_size);
        match &mut self.raw {
            Some(extent) => &mut extent.as_bytes_mut()[range],
            None => &mut [],
        }
    }

    /// The whole extent, including slack past `length`.
    pub fn extent_bytes(&self) -> &[u8] {
        match &self.raw {
            Some(extent) => extent.as_bytes(),
            None => &[],
        }
    }

    /// The whole extent as mutable bytes, including slack past `length`.
    pub fn extent_bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.raw {
            Some(extent) => extent.as_bytes_mut(),
            None => &mut [],
        }
    }

    /// Bytes of the in-use element at `index`, or `None` past `length`.
    pub fn element(&self, index: u32, element_size: usize) -> Option<&[u8]> {
        if index >= self.length {
            return None;
        }
        let range = raw::element_range(index, index + 1, element_size);
        self.raw.as_ref().map(|extent| &extent.as_bytes()[range])
    }

    /// Mutable bytes of the in-use element at `index`, or `None` past `length`.
    pub fn element_mut(&mut self, index: u32, element_size: usize) -> Option<&mut [u8]> {
        if index >= self.length {
            return None;
        }
        let range = raw::element_range(index, index + 1, element_size);
        self.raw
            .as_mut()
            .map(|extent| &mut extent.as_bytes_mut()[range])
    }

    /// The allocator this storage draws from.
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// The growth policy used by [`expand`](Self::expand).
    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Size of the owned extent in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.raw.as_ref().map_or(0, Extent::len)
    }

    fn allocate_elements(&self, elements: u32, element_size: usize) -> Result<Extent, BufferError> {
        let requested = raw::byte_len(elements, element_size)?;
        let Some(extent) = self.allocator.allocate(requested) else {
            warn!(requested, elements, element_size, "allocator refused extent");
            return Err(BufferError::AllocationFailed { requested });
        };
        assert_eq!(
            extent.len(),
            requested,
            "allocator returned an extent of the wrong size"
        );
        Ok(extent)
    }
}

impl<A: Allocator> Drop for Storage<A> {
    fn drop(&mut self) {
        if let Some(extent) = self.raw.take() {
            self.allocator.free(extent);
        }
    }
}

impl<A: Allocator> fmt::Debug for Storage<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("length", &self.length)
            .field("length_max", &self.length_max)
            .field("extent", &self.raw)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn assert_element_size(element_size: usize) {
    assert!(element_size > 0, "element size must be non-zero");
}
