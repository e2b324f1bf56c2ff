//! Element-addressed byte arithmetic.
//!
//! Every offset computation on an extent goes through these helpers so
//! that element indices are turned into byte ranges in one place. All of
//! them operate on slices and panic (rather than corrupt memory) if a
//! range falls outside the extent.

use std::ops::Range;

use growbuf_core::BufferError;

/// Number of bytes occupied by `elements` elements of `element_size` bytes.
pub(crate) fn byte_len(elements: u32, element_size: usize) -> Result<usize, BufferError> {
    (elements as usize)
        .checked_mul(element_size)
        .ok_or(BufferError::CapacityOverflow {
            elements: u64::from(elements),
            element_size,
        })
}

/// Byte range covering elements `[start, end)`.
///
/// Callers only pass indices bounded by a capacity whose byte size was
/// already validated by [`byte_len`], so the products cannot overflow.
pub(crate) fn element_range(start: u32, end: u32, element_size: usize) -> Range<usize> {
    debug_assert!(start <= end);
    start as usize * element_size..end as usize * element_size
}

/// Move `count` elements from index `src` to index `dst` within `bytes`.
///
/// Source and destination may overlap.
pub(crate) fn move_elements(
    bytes: &mut [u8],
    src: u32,
    dst: u32,
    count: u32,
    element_size: usize,
) {
    let from = element_range(src, src + count, element_size);
    bytes.copy_within(from, dst as usize * element_size);
}

/// Copy the first `count` elements of `src` into the start of `dst`.
pub(crate) fn copy_elements(dst: &mut [u8], src: &[u8], count: u32, element_size: usize) {
    let range = element_range(0, count, element_size);
    dst[range.clone()].copy_from_slice(&src[range]);
}

/// Zero elements `[start, end)`.
pub(crate) fn zero_elements(bytes: &mut [u8], start: u32, end: u32, element_size: usize) {
    bytes[element_range(start, end, element_size)].fill(0);
}
