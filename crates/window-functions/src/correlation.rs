//! Pearson Correlation Across Two Inputs

use crate::{FunctionError, WindowFunction};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time_sequence::SequenceView;

/// Pearson correlation of two inputs over their shared timestamps.
///
/// Samples are paired only where both inputs carry a present value at the
/// same timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Correlation;

impl Correlation {
    /// Present values of `a` and `b` sharing a timestamp
    fn pairs(a: &SequenceView<'_>, b: &SequenceView<'_>) -> Vec<(f64, f64)> {
        let mut left = a.samples().peekable();
        let mut right = b.samples().peekable();
        let mut pairs = Vec::new();

        while let (Some(&(ta, va)), Some(&(tb, vb))) = (left.peek(), right.peek()) {
            match ta.cmp(&tb) {
                Ordering::Less => {
                    left.next();
                }
                Ordering::Greater => {
                    right.next();
                }
                Ordering::Equal => {
                    pairs.push((va, vb));
                    left.next();
                    right.next();
                }
            }
        }
        pairs
    }
}

impl WindowFunction for Correlation {
    fn name(&self) -> &str {
        "corr"
    }

    fn outputs(&self) -> Vec<String> {
        vec!["corr".to_string()]
    }

    fn input_arity(&self) -> Option<usize> {
        Some(2)
    }

    fn invoke(&self, inputs: &[SequenceView<'_>]) -> Result<Vec<f64>, FunctionError> {
        let [a, b] = inputs else {
            return Err(FunctionError::InputArity {
                expected: 2,
                actual: inputs.len(),
            });
        };

        let pairs = Self::pairs(a, b);
        if pairs.len() < 2 {
            return Err(FunctionError::InsufficientData {
                needed: 2,
                actual: pairs.len(),
            });
        }

        let n = pairs.len() as f64;
        let mean_a = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_b = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (x, y) in &pairs {
            let dx = x - mean_a;
            let dy = y - mean_b;
            cov += dx * dy;
            var_a += dx * dx;
            var_b += dy * dy;
        }

        if var_a == 0.0 || var_b == 0.0 {
            return Err(FunctionError::failed("correlation undefined for a constant input"));
        }

        Ok(vec![cov / (var_a.sqrt() * var_b.sqrt())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time_sequence::TimeSequence;

    #[test]
    fn test_perfect_correlation_on_shared_timestamps() {
        let a = TimeSequence::offsets("a", vec![0, 1, 2, 3], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        // Timestamp 5 has no partner in `a`
        let b = TimeSequence::offsets("b", vec![1, 2, 3, 5], vec![20.0, 30.0, 40.0, -7.0]).unwrap();

        let corr = Correlation.invoke(&[a.full_view(), b.full_view()]).unwrap();
        assert!((corr[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_anticorrelation() {
        let a = TimeSequence::offsets("a", vec![0, 1, 2], vec![1.0, 2.0, 3.0]).unwrap();
        let b = TimeSequence::offsets("b", vec![0, 1, 2], vec![3.0, 2.0, 1.0]).unwrap();
        let corr = Correlation.invoke(&[a.full_view(), b.full_view()]).unwrap();
        assert!((corr[0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_requires_two_inputs() {
        let a = TimeSequence::offsets("a", vec![0], vec![1.0]).unwrap();
        let err = Correlation.invoke(&[a.full_view()]).unwrap_err();
        assert_eq!(err, FunctionError::InputArity { expected: 2, actual: 1 });
    }

    #[test]
    fn test_constant_input_fails() {
        let a = TimeSequence::offsets("a", vec![0, 1], vec![1.0, 1.0]).unwrap();
        let b = TimeSequence::offsets("b", vec![0, 1], vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            Correlation.invoke(&[a.full_view(), b.full_view()]),
            Err(FunctionError::Failed(_))
        ));
    }
}
