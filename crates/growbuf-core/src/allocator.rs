//! The allocator capability and the extents it hands out.
//!
//! An [`Extent`] is one contiguous byte region. Extents are plain owned
//! values: whoever holds one is responsible for returning it through
//! [`Allocator::free`]. A storage owns its current extent; an extent handed
//! back by an expansion belongs to the caller until it is freed.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// A single contiguous byte region obtained from an [`Allocator`].
pub struct Extent {
    bytes: Box<[u8]>,
}

impl Extent {
    /// Reserve `size` bytes from the global heap, zero-initialised.
    ///
    /// Returns `None` if the heap cannot satisfy the request. The
    /// reservation goes through `Vec::try_reserve_exact`, so an oversized
    /// request is refused instead of aborting the process.
    pub fn try_zeroed(size: usize) -> Option<Self> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size).ok()?;
        bytes.resize(size, 0);
        Some(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    /// Size of the extent in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the extent holds zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Address of the first byte.
    ///
    /// Stable for the lifetime of the extent; allocators use it as an
    /// identity key. Zero-sized extents share a dangling address.
    pub fn addr(&self) -> usize {
        self.bytes.as_ptr() as usize
    }

    /// The whole extent as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The whole extent as a mutable byte slice.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl From<Box<[u8]>> for Extent {
    fn from(bytes: Box<[u8]>) -> Self {
        Self { bytes }
    }
}

impl From<Vec<u8>> for Extent {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }
}

impl fmt::Debug for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extent")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("len", &self.len())
            .finish()
    }
}

/// Raw allocate/free capability consumed by storages.
///
/// Implementations take `&self` so a single allocator can serve many
/// storages; stateful allocators use interior mutability. Passing `&A`,
/// `Rc<A>` or `Arc<A>` lends an allocator without giving it away.
pub trait Allocator {
    /// Provide an extent of exactly `size` bytes, or `None` on failure.
    fn allocate(&self, size: usize) -> Option<Extent>;

    /// Take back an extent previously returned by [`allocate`](Self::allocate).
    fn free(&self, extent: Extent);
}

/// The global heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapAllocator;

impl Allocator for HeapAllocator {
    fn allocate(&self, size: usize) -> Option<Extent> {
        Extent::try_zeroed(size)
    }

    fn free(&self, extent: Extent) {
        drop(extent);
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, size: usize) -> Option<Extent> {
        (**self).allocate(size)
    }

    fn free(&self, extent: Extent) {
        (**self).free(extent)
    }
}

impl<A: Allocator + ?Sized> Allocator for Box<A> {
    fn allocate(&self, size: usize) -> Option<Extent> {
        (**self).allocate(size)
    }

    fn free(&self, extent: Extent) {
        (**self).free(extent)
    }
}

impl<A: Allocator + ?Sized> Allocator for Rc<A> {
    fn allocate(&self, size: usize) -> Option<Extent> {
        (**self).allocate(size)
    }

    fn free(&self, extent: Extent) {
        (**self).free(extent)
    }
}

impl<A: Allocator + ?Sized> Allocator for Arc<A> {
    fn allocate(&self, size: usize) -> Option<Extent> {
        (**self).allocate(size)
    }

    fn free(&self, extent: Extent) {
        (**self).free(extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn heap_extent_is_zeroed_and_exact() {
        let extent = HeapAllocator.allocate(37).unwrap();
        assert_eq!(extent.len(), 37);
        assert!(extent.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn oversized_request_is_refused_not_aborted() {
        assert!(HeapAllocator.allocate(usize::MAX).is_none());
    }

    #[test]
    fn extent_writes_are_visible() {
        let mut extent = Extent::try_zeroed(4).unwrap();
        extent.as_bytes_mut().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(extent.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn extent_from_vec_keeps_contents() {
        let extent = Extent::from(vec![9u8, 8, 7]);
        assert_eq!(extent.len(), 3);
        assert_eq!(extent.as_bytes(), &[9, 8, 7]);
    }

    #[test]
    fn debug_omits_contents() {
        let extent = Extent::try_zeroed(16).unwrap();
        let text = format!("{extent:?}");
        assert!(text.contains("len: 16"));
    }

    struct Counting {
        frees: Cell<usize>,
    }

    impl Allocator for Counting {
        fn allocate(&self, size: usize) -> Option<Extent> {
            Extent::try_zeroed(size)
        }

        fn free(&self, _extent: Extent) {
            self.frees.set(self.frees.get() + 1);
        }
    }

    #[test]
    fn borrowed_and_shared_allocators_forward() {
        let inner = Rc::new(Counting {
            frees: Cell::new(0),
        });
        let borrowed = &*inner;
        borrowed.free(borrowed.allocate(1).unwrap());
        let shared = Rc::clone(&inner);
        shared.free(shared.allocate(1).unwrap());
        assert_eq!(inner.frees.get(), 2);
    }
}
