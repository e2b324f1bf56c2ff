//! Byte patterns for checking data movement.
//!
//! Each element gets bytes derived from its index, so a misplaced or
//! truncated element is visible in a failed assertion.

/// The bytes of element `index` for elements of `element_size` bytes.
///
/// Never all-zero and never equal to [`POISON`](crate::POISON) for
/// `element_size >= 1`.
pub fn element_pattern(index: u32, element_size: usize) -> Vec<u8> {
    (0..element_size)
        .map(|j| {
            let b = (index as usize)
                .wrapping_mul(31)
                .wrapping_add(j.wrapping_mul(7))
                % 250;
            // Shift into 1..=250, then move POISON out of the way.
            match b as u8 + 1 {
                crate::POISON => 251,
                v => v,
            }
        })
        .collect()
}

/// `count` consecutive element patterns starting at element 0.
pub fn pattern(count: u32, element_size: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| element_pattern(i, element_size))
        .collect()
}

/// Overwrite `bytes` with consecutive element patterns.
///
/// # Panics
///
/// Panics if `bytes.len()` is not a multiple of `element_size`.
pub fn fill_pattern(bytes: &mut [u8], element_size: usize) {
    assert_eq!(bytes.len() % element_size, 0, "partial element in slice");
    for (i, chunk) in bytes.chunks_exact_mut(element_size).enumerate() {
        chunk.copy_from_slice(&element_pattern(i as u32, element_size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_are_non_zero_and_not_poison() {
        for i in 0..500 {
            for b in element_pattern(i, 5) {
                assert_ne!(b, 0);
                assert_ne!(b, crate::POISON);
            }
        }
    }

    #[test]
    fn neighbouring_elements_differ() {
        assert_ne!(element_pattern(3, 4), element_pattern(4, 4));
    }

    #[test]
    fn fill_matches_pattern() {
        let mut bytes = vec![0u8; 12];
        fill_pattern(&mut bytes, 3);
        assert_eq!(bytes, pattern(4, 3));
    }
}
