//! Workload profiles for benchmarking growbuf.
//!
//! - [`append_profile`]: grow one element at a time, as a push loop would
//! - [`front_insert_profile`]: insert every element at index 0
//! - [`copy_profile`]: build a buffer then construct a tight copy of it

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use growbuf::{Allocator, Buffer, BufferError, Storage};

/// Append `count` elements one at a time, writing each element's index
/// into its first byte.
///
/// Returns the number of reallocations performed.
pub fn append_profile<A: Allocator>(
    buf: &mut Buffer<A>,
    count: u32,
    element_size: usize,
) -> Result<u32, BufferError> {
    let mut reallocations = 0;
    for i in 0..count {
        let index = buf.length();
        if buf.grow(element_size, index + 1)? {
            reallocations += 1;
        }
        if let Some(element) = buf.element_mut(index, element_size) {
            element[0] = i as u8;
        }
    }
    Ok(reallocations)
}

/// Insert `count` elements at the front, shifting the rest right each time.
pub fn front_insert_profile<A: Allocator>(
    buf: &mut Buffer<A>,
    count: u32,
    element_size: usize,
) -> Result<(), BufferError> {
    for i in 0..count {
        let len = buf.length();
        buf.grow(element_size, len + 1)?;
        buf.set_length(len);
        buf.shift_mem(0, 1, element_size);
        buf.set_length(len + 1);
        if let Some(element) = buf.element_mut(0, element_size) {
            element.fill(i as u8);
        }
    }
    Ok(())
}

/// Fill a buffer with `count` elements and copy it into `target`.
///
/// Returns the number of bytes copied.
pub fn copy_profile<A: Allocator, B: Allocator>(
    source: &mut Buffer<A>,
    target: &mut Storage<B>,
    count: u32,
    element_size: usize,
) -> Result<usize, BufferError> {
    source.grow(element_size, count)?;
    target.copy_from(source.as_storage(), element_size)
}
