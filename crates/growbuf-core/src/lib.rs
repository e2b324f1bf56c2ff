//! Core types for the growbuf buffer engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! pieces every buffer is built from: the [`Allocator`] capability and the
//! [`Extent`] values it hands out, the [`GrowthPolicy`] that sizes each
//! expansion, and the [`BufferError`] type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod config;
pub mod error;

pub use allocator::{Allocator, Extent, HeapAllocator};
pub use config::GrowthPolicy;
pub use error::BufferError;
