//! Extraction Error Types

use thiserror::Error;
use time_sequence::IndexKind;
use window_functions::FunctionError;
use windowing::{ExtentUnit, Window, WindowError};

/// Result alias for extraction runs
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Any failure surfaced by an extraction run
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Descriptor table or run configuration rejected before any work
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input sequences incompatible with the requested descriptors
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Function failure under fail-fast
    #[error("function error: {0}")]
    Function(#[from] FunctionFailure),

    /// Invariant violated past validation; indicates a bug
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Bad descriptor, window spec or run setting
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two descriptors resolve to the same output column
    #[error("output '{name}' produced by descriptors {first} and {second}")]
    DuplicateOutput {
        name: String,
        first: usize,
        second: usize,
    },

    /// Input column not among the provided sequences
    #[error("descriptor {descriptor} reads unknown column '{column}'")]
    UnknownColumn { descriptor: usize, column: String },

    /// Primary column not among the descriptor's inputs
    #[error("descriptor {descriptor} designates '{column}' as primary but does not read it")]
    UnknownPrimary { descriptor: usize, column: String },

    /// Descriptor without input columns
    #[error("descriptor {descriptor} has no input columns")]
    EmptyInputs { descriptor: usize },

    /// Non-positive length or stride, zero occupancy, mixed units
    #[error("descriptor {descriptor} has an invalid window: {source}")]
    Window {
        descriptor: usize,
        #[source]
        source: WindowError,
    },

    /// Output name override does not match the function's output count
    #[error("descriptor {descriptor} names {actual} output(s) but its function declares {expected}")]
    OutputArity {
        descriptor: usize,
        expected: usize,
        actual: usize,
    },

    /// Input column count does not match what the function consumes
    #[error("descriptor {descriptor} passes {actual} input(s) to a function taking {expected}")]
    InputArity {
        descriptor: usize,
        expected: usize,
        actual: usize,
    },

    /// Run setting out of range
    #[error("invalid {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    /// Configuration source could not be read or parsed
    #[error("failed to load configuration: {0}")]
    Source(#[from] config::ConfigError),
}

/// Input sequences cannot serve the requested descriptors
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Inputs of one descriptor use different timestamp kinds
    #[error("descriptor {descriptor}: column '{other}' is indexed differently from primary '{primary}'")]
    IndexMismatch {
        descriptor: usize,
        primary: String,
        other: String,
    },

    /// Window unit cannot be measured on the column's index
    #[error("descriptor {descriptor}: {unit} windows cannot be applied to the {kind:?} index of '{column}'")]
    IncompatibleWindow {
        descriptor: usize,
        column: String,
        unit: ExtentUnit,
        kind: IndexKind,
    },

    /// Descriptors would place results on different timestamp axes
    #[error("primary column '{other}' is indexed differently from '{first}'; results need one timestamp axis")]
    MixedAxes { first: String, other: String },
}

/// A function invocation that failed, with enough context to reproduce it
#[derive(Debug, Clone, PartialEq, Error)]
#[error("descriptor {descriptor} ({label}) failed on window {window}: {error}")]
pub struct FunctionFailure {
    /// Position of the descriptor in declaration order
    pub descriptor: usize,
    /// Human-readable descriptor identity
    pub label: String,
    /// Bounds of the failing window
    pub window: Window,
    /// Underlying failure
    #[source]
    pub error: FunctionError,
}

impl ConfigError {
    /// Lift a window error raised while validating a descriptor
    pub(crate) fn window(descriptor: usize, source: WindowError) -> Self {
        ConfigError::Window { descriptor, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time_sequence::Timestamp;

    #[test]
    fn test_function_failure_message_carries_context() {
        let failure = FunctionFailure {
            descriptor: 2,
            label: "mean(EDA) w=3_s=2".to_string(),
            window: Window {
                start: Timestamp(4),
                end: Timestamp(7),
            },
            error: FunctionError::failed("boom"),
        };
        let message = FeatureError::from(failure).to_string();
        assert!(message.contains("descriptor 2"));
        assert!(message.contains("[4, 7)"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_config_error_wraps_window_error() {
        let err = ConfigError::window(0, WindowError::ZeroOccupancy);
        assert!(err.to_string().contains("at least 1"));
    }
}
