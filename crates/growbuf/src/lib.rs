//! Type-erased growable byte buffers.
//!
//! A [`Storage`] owns one raw extent and counts elements without knowing
//! their type; callers pass the element size to every operation. A
//! [`Buffer`] wraps a storage and adds [`Buffer::grow`], which expands the
//! extent along a two-phase curve: capacity doubles while it is small and
//! grows by a fixed increment once it is large.
//!
//! # Architecture
//!
//! ```text
//! Buffer (grow: migrate live bytes, free old extent, zero the new tail)
//! └── Storage (preallocate, expand, shift_mem, copy_from)
//!     ├── Option<Extent> (one owned byte region)
//!     ├── GrowthPolicy (next capacity: double below 64, then +64)
//!     └── A: Allocator (injected allocate/free capability)
//! ```
//!
//! # Example
//!
//! ```
//! use growbuf::Buffer;
//!
//! let mut buf = Buffer::on_heap();
//! assert!(buf.grow(4, 3).unwrap());
//! assert_eq!(buf.length(), 3);
//! assert_eq!(buf.length_max(), 8);
//!
//! buf.element_mut(0, 4).unwrap().copy_from_slice(&7u32.to_le_bytes());
//! assert_eq!(buf.element(0, 4), Some(&7u32.to_le_bytes()[..]));
//! // Elements exposed by a reallocating grow start zeroed.
//! assert_eq!(buf.element(2, 4), Some(&[0u8; 4][..]));
//! ```
//!
//! # Failure model
//!
//! Allocation failure is always reported as [`BufferError`] and leaves the
//! storage as it was. Contract violations (preallocating twice, shifting
//! outside the extent, a zero element size) panic.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
mod raw;
pub mod storage;

// Public re-exports for the primary API surface.
pub use buffer::Buffer;
pub use growbuf_core::{Allocator, BufferError, Extent, GrowthPolicy, HeapAllocator};
pub use storage::Storage;
