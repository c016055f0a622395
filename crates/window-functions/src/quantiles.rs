//! Quantile Window Function

use crate::{single_input, FunctionError, WindowFunction};
use serde::{Deserialize, Serialize};
use time_sequence::SequenceView;

/// Linearly interpolated quantiles of a single input's present values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantiles {
    levels: Vec<f64>,
}

impl Quantiles {
    /// Quantiles at the given levels, each in `[0, 1]`
    pub fn new(levels: impl IntoIterator<Item = f64>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    /// Quantile levels
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }
}

/// Quantile of sorted values by linear interpolation between closest ranks
fn interpolate(sorted: &[f64], level: f64) -> f64 {
    let rank = level * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

impl WindowFunction for Quantiles {
    fn name(&self) -> &str {
        "quantiles"
    }

    fn outputs(&self) -> Vec<String> {
        self.levels.iter().map(|q| format!("q_{}", q)).collect()
    }

    fn invoke(&self, inputs: &[SequenceView<'_>]) -> Result<Vec<f64>, FunctionError> {
        if let Some(bad) = self.levels.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(FunctionError::failed(format!("quantile level {} outside [0, 1]", bad)));
        }

        let mut values = single_input(inputs)?.present_values();
        if values.is_empty() {
            return Err(FunctionError::InsufficientData {
                needed: 1,
                actual: 0,
            });
        }
        values.sort_by(f64::total_cmp);

        Ok(self.levels.iter().map(|q| interpolate(&values, *q)).collect())
    }
}
