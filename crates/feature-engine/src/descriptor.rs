//! Feature Descriptors
//!
//! A descriptor binds one window function to its input columns and a window
//! spec. [`FeatureGrid`] expands the cross product of several functions,
//! inputs and window sizes into descriptors.

use std::fmt;
use std::sync::Arc;
use window_functions::WindowFunction;
use windowing::{Extent, WindowSpec};

/// One requested extraction: function, inputs and window spec
#[derive(Debug, Clone)]
pub struct FeatureDescriptor {
    function: Arc<dyn WindowFunction>,
    inputs: Vec<String>,
    window: WindowSpec,
    output_names: Option<Vec<String>>,
    primary: Option<String>,
}

impl FeatureDescriptor {
    /// Create a descriptor reading `inputs` in order
    pub fn new<F, I, S>(function: F, inputs: I, window: WindowSpec) -> Self
    where
        F: WindowFunction + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_arc(Arc::new(function), inputs, window)
    }

    /// Create a descriptor sharing an already boxed function
    pub fn from_arc<I, S>(function: Arc<dyn WindowFunction>, inputs: I, window: WindowSpec) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            function,
            inputs: inputs.into_iter().map(Into::into).collect(),
            window,
            output_names: None,
            primary: None,
        }
    }

    /// Replace the derived output names
    pub fn with_output_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Take window boundaries from `column` instead of the first input
    pub fn with_primary(mut self, column: impl Into<String>) -> Self {
        self.primary = Some(column.into());
        self
    }

    /// Bound window function
    pub fn function(&self) -> &dyn WindowFunction {
        self.function.as_ref()
    }

    /// Input column names, in the order the function receives them
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Window spec
    pub fn window(&self) -> &WindowSpec {
        &self.window
    }

    /// Explicit primary column, if any
    pub fn primary(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    /// Position of the column whose index drives the windows
    pub fn primary_position(&self) -> Option<usize> {
        match &self.primary {
            Some(column) => self.inputs.iter().position(|input| input == column),
            None => Some(0),
        }
    }

    /// Explicit output names, if overridden
    pub fn output_override(&self) -> Option<&[String]> {
        self.output_names.as_deref()
    }

    /// Resolved output column names.
    ///
    /// Derived names follow `{inputs joined by '|'}__{output}__w={length}_s={stride}`.
    pub fn output_names(&self) -> Vec<String> {
        if let Some(names) = &self.output_names {
            return names.clone();
        }
        let series = self.inputs.join("|");
        self.function
            .outputs()
            .iter()
            .map(|output| format!("{}__{}__{}", series, output, self.window))
            .collect()
    }

    /// Short identity used in logs and failures
    pub fn label(&self) -> String {
        format!("{}({}) {}", self.function.name(), self.inputs.join(", "), self.window)
    }
}

impl fmt::Display for FeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?} -> {:?}",
            self.label(),
            self.inputs,
            self.output_names()
        )
    }
}

/// Cross product of functions, inputs and window sizes
#[derive(Debug, Clone, Default)]
pub struct FeatureGrid {
    functions: Vec<Arc<dyn WindowFunction>>,
    inputs: Vec<Vec<String>>,
    lengths: Vec<Extent>,
    strides: Vec<Extent>,
    min_occupancy: Option<usize>,
}

impl FeatureGrid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function
    pub fn function<F: WindowFunction + 'static>(mut self, function: F) -> Self {
        self.functions.push(Arc::new(function));
        self
    }

    /// Add a single-column input
    pub fn input(mut self, column: impl Into<String>) -> Self {
        self.inputs.push(vec![column.into()]);
        self
    }

    /// Add a multi-column input
    pub fn input_group<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Window lengths to try
    pub fn lengths(mut self, lengths: impl IntoIterator<Item = Extent>) -> Self {
        self.lengths.extend(lengths);
        self
    }

    /// Strides to try
    pub fn strides(mut self, strides: impl IntoIterator<Item = Extent>) -> Self {
        self.strides.extend(strides);
        self
    }

    /// Minimum occupancy applied to every expanded window spec
    pub fn min_occupancy(mut self, count: usize) -> Self {
        self.min_occupancy = Some(count);
        self
    }

    /// Number of descriptors the grid expands to
    pub fn len(&self) -> usize {
        self.functions.len() * self.inputs.len() * self.lengths.len() * self.strides.len()
    }

    /// Check if the grid expands to nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand in function, input, length, stride order
    pub fn expand(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::with_capacity(self.len());
        for function in &self.functions {
            for inputs in &self.inputs {
                for length in &self.lengths {
                    for stride in &self.strides {
                        let mut window = WindowSpec::new(*length, *stride);
                        if let Some(count) = self.min_occupancy {
                            window = window.with_min_occupancy(count);
                        }
                        descriptors.push(FeatureDescriptor::from_arc(
                            Arc::clone(function),
                            inputs.iter().cloned(),
                            window,
                        ));
                    }
                }
            }
        }
        descriptors
    }
}
