//! Function Error Types

use thiserror::Error;

/// Errors raised by a single window function invocation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    /// Function-specific failure
    #[error("{0}")]
    Failed(String),

    /// Wrong number of input slices
    #[error("expected {expected} input(s), got {actual}")]
    InputArity { expected: usize, actual: usize },

    /// Returned value count differs from the declared outputs
    #[error("returned {actual} value(s) for {expected} declared output(s)")]
    OutputArity { expected: usize, actual: usize },

    /// Window holds too few present samples for the computation
    #[error("need at least {needed} sample(s), got {actual}")]
    InsufficientData { needed: usize, actual: usize },

    /// Function body panicked
    #[error("panicked: {0}")]
    Panicked(String),
}

impl FunctionError {
    /// Shorthand for [`FunctionError::Failed`]
    pub fn failed(message: impl Into<String>) -> Self {
        FunctionError::Failed(message.into())
    }
}
