//! Statistical Window Functions

use crate::{single_input, FunctionError, WindowFunction};
use serde::{Deserialize, Serialize};
use time_sequence::SequenceView;

/// Moments and shape descriptors of a window's values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Moments {
    /// Number of values
    pub count: usize,
    /// Sum of values
    pub sum: f64,
    /// Mean value
    pub mean: f64,
    /// Standard deviation (population)
    pub std_dev: f64,
    /// Skewness (asymmetry)
    pub skewness: f64,
    /// Kurtosis (tailedness, excess)
    pub kurtosis: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean absolute change between consecutive values
    pub rate_of_change: f64,
    /// Number of crossings of the mean
    pub zero_crossings: usize,
}

impl Moments {
    /// Compute moments from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let sum = values.iter().sum::<f64>();
        let mean = sum / n;

        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        for &v in values {
            let d = v - mean;
            m2 += d * d;
            m3 += d * d * d;
            m4 += d * d * d * d;
        }

        let variance = m2 / n;
        let std_dev = variance.sqrt();

        // E[(X-μ)³] / σ³
        let skewness = if std_dev > 0.0 {
            (m3 / n) / (std_dev * std_dev * std_dev)
        } else {
            0.0
        };

        // E[(X-μ)⁴] / σ⁴ - 3
        let kurtosis = if std_dev > 0.0 {
            (m4 / n) / (variance * variance) - 3.0
        } else {
            0.0
        };

        let rate_of_change = if values.len() >= 2 {
            let total: f64 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
            total / (values.len() - 1) as f64
        } else {
            0.0
        };

        let zero_crossings = values
            .windows(2)
            .filter(|w| {
                let prev = w[0] - mean;
                let curr = w[1] - mean;
                prev.signum() != curr.signum() && prev != 0.0 && curr != 0.0
            })
            .count();

        Self {
            count: values.len(),
            sum,
            mean,
            std_dev,
            skewness,
            kurtosis,
            min,
            max,
            rate_of_change,
            zero_crossings,
        }
    }
}

/// One statistic selectable from [`Moments`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Count,
    Sum,
    Mean,
    StdDev,
    Skewness,
    Kurtosis,
    Min,
    Max,
    RateOfChange,
    ZeroCrossings,
}

impl Statistic {
    /// Every statistic, in declaration order
    pub const ALL: [Statistic; 10] = [
        Statistic::Count,
        Statistic::Sum,
        Statistic::Mean,
        Statistic::StdDev,
        Statistic::Skewness,
        Statistic::Kurtosis,
        Statistic::Min,
        Statistic::Max,
        Statistic::RateOfChange,
        Statistic::ZeroCrossings,
    ];

    /// Output name
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Count => "count",
            Statistic::Sum => "sum",
            Statistic::Mean => "mean",
            Statistic::StdDev => "std",
            Statistic::Skewness => "skewness",
            Statistic::Kurtosis => "kurtosis",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::RateOfChange => "rate_of_change",
            Statistic::ZeroCrossings => "zero_crossings",
        }
    }

    fn pick(&self, moments: &Moments) -> f64 {
        match self {
            Statistic::Count => moments.count as f64,
            Statistic::Sum => moments.sum,
            Statistic::Mean => moments.mean,
            Statistic::StdDev => moments.std_dev,
            Statistic::Skewness => moments.skewness,
            Statistic::Kurtosis => moments.kurtosis,
            Statistic::Min => moments.min,
            Statistic::Max => moments.max,
            Statistic::RateOfChange => moments.rate_of_change,
            Statistic::ZeroCrossings => moments.zero_crossings as f64,
        }
    }
}

/// Selected statistics of a single input's present values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    name: String,
    stats: Vec<Statistic>,
}

impl Statistics {
    /// Several statistics as one vector-valued function
    pub fn new(stats: impl IntoIterator<Item = Statistic>) -> Self {
        Self {
            name: "statistics".to_string(),
            stats: stats.into_iter().collect(),
        }
    }

    /// One statistic as a scalar function named after it
    pub fn single(stat: Statistic) -> Self {
        Self {
            name: stat.name().to_string(),
            stats: vec![stat],
        }
    }

    /// Every statistic
    pub fn all() -> Self {
        Self::new(Statistic::ALL)
    }
}

impl WindowFunction for Statistics {
    fn name(&self) -> &str {
        &self.name
    }

    fn outputs(&self) -> Vec<String> {
        self.stats.iter().map(|s| s.name().to_string()).collect()
    }

    fn invoke(&self, inputs: &[SequenceView<'_>]) -> Result<Vec<f64>, FunctionError> {
        let values = single_input(inputs)?.present_values();
        if values.is_empty() {
            return Err(FunctionError::InsufficientData {
                needed: 1,
                actual: 0,
            });
        }
        let moments = Moments::compute(&values);
        Ok(self.stats.iter().map(|s| s.pick(&moments)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FunctionKind;
    use time_sequence::TimeSequence;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let moments = Moments::compute(&values);
        assert!((moments.mean - 3.0).abs() < 0.001);
        assert_eq!(moments.sum, 15.0);
        assert_eq!(moments.count, 5);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let moments = Moments::compute(&values);
        assert!((moments.std_dev - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_zero_crossings() {
        // Values oscillating around mean of 5
        let values = vec![3.0, 7.0, 4.0, 8.0, 2.0, 6.0];
        let moments = Moments::compute(&values);
        assert!(moments.zero_crossings >= 2);
    }

    #[test]
    fn test_empty_values() {
        let moments = Moments::compute(&[]);
        assert_eq!(moments.mean, 0.0);
        assert_eq!(moments.count, 0);
    }

    #[test]
    fn test_statistics_function_outputs() {
        let seq = TimeSequence::offsets("x", vec![0, 1, 2, 3], vec![4.0, f64::NAN, 1.0, 7.0]).unwrap();
        let stats = Statistics::new([Statistic::Min, Statistic::Max, Statistic::Count]);

        assert_eq!(stats.kind(), FunctionKind::Vector);
        assert_eq!(stats.outputs(), vec!["min", "max", "count"]);
        assert_eq!(stats.invoke(&[seq.full_view()]).unwrap(), vec![1.0, 7.0, 3.0]);
    }

    #[test]
    fn test_single_statistic_is_scalar() {
        let mean = Statistics::single(Statistic::Mean);
        assert_eq!(mean.name(), "mean");
        assert_eq!(mean.kind(), FunctionKind::Scalar);
    }

    #[test]
    fn test_all_absent_window_fails() {
        let seq = TimeSequence::offsets("x", vec![0, 1], vec![f64::NAN, f64::NAN]).unwrap();
        let err = Statistics::single(Statistic::Mean)
            .invoke(&[seq.full_view()])
            .unwrap_err();
        assert_eq!(err, FunctionError::InsufficientData { needed: 1, actual: 0 });
    }
}
