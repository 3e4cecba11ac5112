//! Error types for vector operations.
//!
//! Every shape and bounds condition is checked in all build profiles. The
//! `try_*` methods surface a [`VecteurError`]; operators and indexing panic
//! with the same message.

use thiserror::Error;

/// Errors produced by checked vector operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VecteurError {
    /// Two runtime-length operands disagree on their size.
    #[error("size mismatch: lhs has {lhs} elements, rhs has {rhs}")]
    SizeMismatch {
        /// Size of the left operand.
        lhs: usize,
        /// Size of the right operand.
        rhs: usize,
    },

    /// A fixed-length vector was built from a source of the wrong length.
    #[error("length mismatch: expected {expected} elements, got {got}")]
    LengthMismatch {
        /// The fixed length of the target.
        expected: usize,
        /// The length of the source.
        got: usize,
    },

    /// Indexed access past the end of a vector.
    #[error("index {index} out of bounds for vector of size {size}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The vector size.
        size: usize,
    },

    /// A reduction with no identity was applied to an empty vector.
    #[error("cannot compute {op} of an empty vector")]
    EmptyReduction {
        /// Name of the reduction.
        op: &'static str,
    },
}

/// Result alias for vector operations.
pub type Result<T> = std::result::Result<T, VecteurError>;

/// Panic with the message of `err`.
///
/// Used by the infallible surface (operators, `Index`) where a failed check
/// is a programmer error.
#[cold]
#[track_caller]
pub(crate) fn raise(err: VecteurError) -> ! {
    panic!("{err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = VecteurError::SizeMismatch { lhs: 3, rhs: 4 };
        assert_eq!(err.to_string(), "size mismatch: lhs has 3 elements, rhs has 4");

        let err = VecteurError::LengthMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "length mismatch: expected 3 elements, got 2");

        let err = VecteurError::EmptyReduction { op: "hmax" };
        assert_eq!(err.to_string(), "cannot compute hmax of an empty vector");
    }

    #[test]
    #[should_panic(expected = "index 5 out of bounds for vector of size 2")]
    fn test_raise_panics_with_message() {
        raise(VecteurError::IndexOutOfBounds { index: 5, size: 2 });
    }
}
