//! Window Function Capability

use crate::FunctionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use time_sequence::SequenceView;

/// Output shape of a window function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    /// Exactly one output per window
    Scalar,
    /// Several named outputs per window
    Vector,
}

/// A pure aggregation evaluated once per window.
///
/// Implementations must be stateless: the same function object is shared by
/// every worker and invoked concurrently. Extra parameters are captured when
/// the function is constructed, never looked up at call time.
pub trait WindowFunction: Send + Sync + fmt::Debug {
    /// Name used when deriving output names
    fn name(&self) -> &str;

    /// Declared output names; their count is the output arity
    fn outputs(&self) -> Vec<String>;

    /// Number of input slices consumed, `None` when any count is accepted
    fn input_arity(&self) -> Option<usize> {
        Some(1)
    }

    /// Scalar or vector output
    fn kind(&self) -> FunctionKind {
        if self.outputs().len() == 1 {
            FunctionKind::Scalar
        } else {
            FunctionKind::Vector
        }
    }

    /// Evaluate over aligned input slices, one value per declared output
    fn invoke(&self, inputs: &[SequenceView<'_>]) -> Result<Vec<f64>, FunctionError>;
}

/// Return the only input slice, or an arity error
pub fn single_input<'v, 'a>(
    inputs: &'v [SequenceView<'a>],
) -> Result<&'v SequenceView<'a>, FunctionError> {
    match inputs {
        [input] => Ok(input),
        _ => Err(FunctionError::InputArity {
            expected: 1,
            actual: inputs.len(),
        }),
    }
}

type Body = dyn Fn(&[SequenceView<'_>]) -> Result<Vec<f64>, FunctionError> + Send + Sync;

/// Wraps a closure or function pointer as a [`WindowFunction`]
#[derive(Clone)]
pub struct FuncWrapper {
    name: String,
    outputs: Vec<String>,
    input_arity: Option<usize>,
    body: Arc<Body>,
}

impl FuncWrapper {
    /// Wrap a body that sees the raw input slices
    pub fn new<F>(name: impl Into<String>, outputs: Vec<String>, body: F) -> Self
    where
        F: Fn(&[SequenceView<'_>]) -> Result<Vec<f64>, FunctionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            outputs,
            input_arity: Some(1),
            body: Arc::new(body),
        }
    }

    /// Single-input, single-output function over the present values
    pub fn scalar<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        let name = name.into();
        let outputs = vec![name.clone()];
        Self::new(name, outputs, move |inputs| {
            let values = single_input(inputs)?.present_values();
            Ok(vec![f(&values)])
        })
    }

    /// Single-input function with several named outputs over the present values
    pub fn vector<F>(name: impl Into<String>, outputs: Vec<String>, f: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::new(name, outputs, move |inputs| {
            let values = single_input(inputs)?.present_values();
            Ok(f(&values))
        })
    }

    /// Override the accepted input count (`None` accepts any)
    pub fn with_input_arity(mut self, arity: Option<usize>) -> Self {
        self.input_arity = arity;
        self
    }
}

impl fmt::Debug for FuncWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncWrapper")
            .field("name", &self.name)
            .field("outputs", &self.outputs)
            .field("input_arity", &self.input_arity)
            .finish_non_exhaustive()
    }
}

impl WindowFunction for FuncWrapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn outputs(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn input_arity(&self) -> Option<usize> {
        self.input_arity
    }

    fn invoke(&self, inputs: &[SequenceView<'_>]) -> Result<Vec<f64>, FunctionError> {
        (self.body)(inputs)
    }
}
