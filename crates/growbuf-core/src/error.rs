//! Error types for buffer operations.
//!
//! Only recoverable conditions live here. Contract violations (such as
//! preallocating a storage that already owns an extent) are programmer
//! errors and panic instead.

use std::error::Error;
use std::fmt;

/// Errors that can occur while allocating or sizing a buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// The allocator refused to provide an extent.
    AllocationFailed {
        /// Number of bytes requested.
        requested: usize,
    },
    /// The requested capacity does not fit the element counter or the
    /// address space.
    CapacityOverflow {
        /// Number of elements requested.
        elements: u64,
        /// Size of one element in bytes.
        element_size: usize,
    },
    /// A growth policy was constructed with unusable parameters.
    InvalidPolicy {
        /// Which constraint was violated.
        reason: &'static str,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { requested } => {
                write!(f, "allocation failed: requested {requested} bytes")
            }
            Self::CapacityOverflow {
                elements,
                element_size,
            } => {
                write!(
                    f,
                    "capacity overflow: {elements} elements of {element_size} bytes"
                )
            }
            Self::InvalidPolicy { reason } => {
                write!(f, "invalid growth policy: {reason}")
            }
        }
    }
}

impl Error for BufferError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_requested_bytes() {
        let err = BufferError::AllocationFailed { requested: 512 };
        assert_eq!(err.to_string(), "allocation failed: requested 512 bytes");
    }

    #[test]
    fn display_capacity_overflow() {
        let err = BufferError::CapacityOverflow {
            elements: 1 << 40,
            element_size: 8,
        };
        assert_eq!(
            err.to_string(),
            "capacity overflow: 1099511627776 elements of 8 bytes"
        );
    }

    #[test]
    fn is_std_error() {
        let err: Box<dyn Error> = Box::new(BufferError::InvalidPolicy {
            reason: "max_increment must be non-zero",
        });
        assert!(err.to_string().contains("max_increment"));
    }
}
