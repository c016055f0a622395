//! Windowing Error Types

use crate::ExtentUnit;
use thiserror::Error;
use time_sequence::IndexKind;

/// Errors raised when a window spec cannot be applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    /// Length or stride is zero or negative
    #[error("window {field} must be positive")]
    NonPositive { field: &'static str },

    /// Minimum occupancy of zero would admit empty windows
    #[error("minimum occupancy must be at least 1")]
    ZeroOccupancy,

    /// Length and stride expressed in different units
    #[error("window length is in {length} but stride is in {stride}")]
    MixedUnits {
        length: ExtentUnit,
        stride: ExtentUnit,
    },

    /// Extent unit cannot be applied to the index kind
    #[error("{unit} windows cannot be applied to a {kind:?} index")]
    IncompatibleIndex { unit: ExtentUnit, kind: IndexKind },

    /// Aligned inputs use different timestamp kinds
    #[error("input '{other}' is indexed differently from primary input '{primary}'")]
    IndexKindMismatch { primary: String, other: String },

    /// Segmenter given no inputs
    #[error("no input sequences to segment")]
    EmptyInputs,

    /// Primary input position outside the input list
    #[error("primary input {primary} out of range for {inputs} inputs")]
    PrimaryOutOfRange { primary: usize, inputs: usize },
}
