//! Growth policy parameters.

use crate::error::BufferError;

/// Capacity growth curve used when a storage has to expand.
///
/// The next capacity is computed from the current capacity and the
/// minimum the caller needs:
///
/// ```text
/// next = max(current, min_length, min_threshold)
/// next = next + min(next, max_increment)
/// ```
///
/// Below `max_increment` the capacity doubles on each expansion; above it
/// every expansion adds exactly `max_increment` elements, which caps the
/// slack of large buffers. Validated at construction; immutable after.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthPolicy {
    min_threshold: u32,
    max_increment: u32,
}

impl GrowthPolicy {
    /// Smallest capacity an expansion starts from.
    pub const DEFAULT_MIN_THRESHOLD: u32 = 4;

    /// Largest number of elements a single expansion adds as slack.
    pub const DEFAULT_MAX_INCREMENT: u32 = 64;

    /// The default curve: doubling from 4 up to 64, then +64 per step.
    pub const DEFAULT: Self = Self {
        min_threshold: Self::DEFAULT_MIN_THRESHOLD,
        max_increment: Self::DEFAULT_MAX_INCREMENT,
    };

    /// Create a policy with custom parameters.
    ///
    /// Both values must be non-zero, otherwise an expansion could leave the
    /// capacity unchanged.
    pub fn new(min_threshold: u32, max_increment: u32) -> Result<Self, BufferError> {
        if min_threshold == 0 {
            return Err(BufferError::InvalidPolicy {
                reason: "min_threshold must be non-zero",
            });
        }
        if max_increment == 0 {
            return Err(BufferError::InvalidPolicy {
                reason: "max_increment must be non-zero",
            });
        }
        Ok(Self {
            min_threshold,
            max_increment,
        })
    }

    /// Smallest capacity an expansion starts from.
    pub fn min_threshold(&self) -> u32 {
        self.min_threshold
    }

    /// Cap on the slack added by a single expansion.
    pub fn max_increment(&self) -> u32 {
        self.max_increment
    }

    /// Capacity to expand to from `current` so that at least `min_length`
    /// elements fit.
    ///
    /// Returns `None` if the result does not fit in a `u32`.
    pub fn next_capacity(&self, current: u32, min_length: u32) -> Option<u32> {
        let next = current.max(min_length).max(self.min_threshold);
        next.checked_add(next.min(self.max_increment))
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}
