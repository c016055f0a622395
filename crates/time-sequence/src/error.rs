//! Sequence Error Types

use thiserror::Error;

/// Errors raised while building sequences or sequence sets
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequenceError {
    /// Index and value columns differ in length
    #[error("sequence '{name}': index has {index_len} entries but values have {values_len}")]
    LengthMismatch {
        name: String,
        index_len: usize,
        values_len: usize,
    },

    /// Index is not strictly increasing
    #[error("sequence '{name}': index is not strictly increasing at position {position}")]
    NonMonotonicIndex { name: String, position: usize },

    /// Wall-clock instant outside the representable nanosecond range
    #[error("sequence '{name}': timestamp at position {position} is out of range")]
    TimestampOutOfRange { name: String, position: usize },

    /// Two sequences registered under the same name
    #[error("duplicate sequence name: {0}")]
    DuplicateName(String),
}
