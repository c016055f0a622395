//! Window Specifications

use crate::WindowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use time_sequence::IndexKind;

const NANOS_PER_US: i64 = 1_000;
const NANOS_PER_MS: i64 = 1_000_000;
const NANOS_PER_SEC: i64 = 1_000_000_000;
const NANOS_PER_MIN: i64 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MIN;

/// Size of a window or stride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extent {
    /// Fixed number of samples
    Samples(usize),
    /// Fixed span on an offset index, in index units
    Span(i64),
    /// Fixed duration on a wall-clock index, in nanoseconds
    Time(i64),
}

/// Unit an [`Extent`] is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtentUnit {
    Samples,
    Span,
    Time,
}

impl fmt::Display for ExtentUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtentUnit::Samples => write!(f, "samples"),
            ExtentUnit::Span => write!(f, "index units"),
            ExtentUnit::Time => write!(f, "time"),
        }
    }
}

impl Extent {
    /// Count of samples
    pub fn samples(count: usize) -> Self {
        Extent::Samples(count)
    }

    /// Span on an offset index
    pub fn span(ticks: i64) -> Self {
        Extent::Span(ticks)
    }

    /// Wall-clock duration (saturates at the nanosecond range)
    pub fn duration(duration: chrono::Duration) -> Self {
        Extent::Time(duration.num_nanoseconds().unwrap_or(i64::MAX))
    }

    /// Wall-clock duration in (fractional) seconds
    pub fn seconds(secs: f64) -> Self {
        Extent::Time((secs * NANOS_PER_SEC as f64).round() as i64)
    }

    /// Wall-clock duration in milliseconds
    pub fn millis(ms: i64) -> Self {
        Extent::Time(ms.saturating_mul(NANOS_PER_MS))
    }

    /// Unit of this extent
    pub fn unit(&self) -> ExtentUnit {
        match self {
            Extent::Samples(_) => ExtentUnit::Samples,
            Extent::Span(_) => ExtentUnit::Span,
            Extent::Time(_) => ExtentUnit::Time,
        }
    }

    /// Check the extent is strictly positive
    pub fn is_positive(&self) -> bool {
        match *self {
            Extent::Samples(n) => n > 0,
            Extent::Span(t) | Extent::Time(t) => t > 0,
        }
    }

    /// Check the extent can be measured on an index of the given kind
    pub fn supports(&self, kind: IndexKind) -> bool {
        matches!(
            (self, kind),
            (Extent::Samples(_), _)
                | (Extent::Span(_), IndexKind::Offset)
                | (Extent::Time(_), IndexKind::WallClock)
        )
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Extent::Samples(n) => write!(f, "{}", n),
            Extent::Span(t) => write!(f, "{}", t),
            Extent::Time(nanos) => write!(f, "{}", compact_duration(nanos)),
        }
    }
}

/// Render nanoseconds as `2h`, `5m`, `5s`, `2.5s`, `500ms`, ...
fn compact_duration(nanos: i64) -> String {
    if nanos != 0 && nanos % NANOS_PER_HOUR == 0 {
        format!("{}h", nanos / NANOS_PER_HOUR)
    } else if nanos != 0 && nanos % NANOS_PER_MIN == 0 {
        format!("{}m", nanos / NANOS_PER_MIN)
    } else if nanos % NANOS_PER_SEC == 0 {
        format!("{}s", nanos / NANOS_PER_SEC)
    } else if nanos.abs() >= NANOS_PER_SEC {
        format!("{}s", nanos as f64 / NANOS_PER_SEC as f64)
    } else if nanos % NANOS_PER_MS == 0 {
        format!("{}ms", nanos / NANOS_PER_MS)
    } else if nanos % NANOS_PER_US == 0 {
        format!("{}us", nanos / NANOS_PER_US)
    } else {
        format!("{}ns", nanos)
    }
}

/// Which point of a window labels its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAnchor {
    Begin,
    Middle,
    #[default]
    End,
}

/// Window length, stride and minimum occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    length: Extent,
    stride: Extent,
    #[serde(default)]
    min_occupancy: Option<usize>,
}

impl WindowSpec {
    /// Create a spec; occupancy falls back to the run default
    pub fn new(length: Extent, stride: Extent) -> Self {
        Self {
            length,
            stride,
            min_occupancy: None,
        }
    }

    /// Sample-count spec
    pub fn samples(length: usize, stride: usize) -> Self {
        Self::new(Extent::Samples(length), Extent::Samples(stride))
    }

    /// Offset-span spec
    pub fn span(length: i64, stride: i64) -> Self {
        Self::new(Extent::Span(length), Extent::Span(stride))
    }

    /// Wall-clock spec in seconds
    pub fn seconds(length: f64, stride: f64) -> Self {
        Self::new(Extent::seconds(length), Extent::seconds(stride))
    }

    /// Require at least `count` present samples per window
    pub fn with_min_occupancy(mut self, count: usize) -> Self {
        self.min_occupancy = Some(count);
        self
    }

    /// Window length
    pub fn length(&self) -> Extent {
        self.length
    }

    /// Offset between consecutive window starts
    pub fn stride(&self) -> Extent {
        self.stride
    }

    /// Explicit minimum occupancy, if set
    pub fn min_occupancy(&self) -> Option<usize> {
        self.min_occupancy
    }

    /// Minimum occupancy, falling back to `default`
    pub fn min_occupancy_or(&self, default: usize) -> usize {
        self.min_occupancy.unwrap_or(default)
    }

    /// Check positivity and unit agreement
    pub fn validate(&self) -> Result<(), WindowError> {
        if !self.length.is_positive() {
            return Err(WindowError::NonPositive { field: "length" });
        }
        if !self.stride.is_positive() {
            return Err(WindowError::NonPositive { field: "stride" });
        }
        if self.min_occupancy == Some(0) {
            return Err(WindowError::ZeroOccupancy);
        }
        if self.length.unit() != self.stride.unit() {
            return Err(WindowError::MixedUnits {
                length: self.length.unit(),
                stride: self.stride.unit(),
            });
        }
        Ok(())
    }

    /// Check the spec can be measured on an index of the given kind
    pub fn check_index(&self, kind: IndexKind) -> Result<(), WindowError> {
        for extent in [self.length, self.stride] {
            if !extent.supports(kind) {
                return Err(WindowError::IncompatibleIndex {
                    unit: extent.unit(),
                    kind,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w={}_s={}", self.length, self.stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_duration_rendering() {
        assert_eq!(Extent::seconds(5.0).to_string(), "5s");
        assert_eq!(Extent::seconds(2.5).to_string(), "2.5s");
        assert_eq!(Extent::seconds(7.5).to_string(), "7.5s");
        assert_eq!(Extent::seconds(60.0).to_string(), "1m");
        assert_eq!(Extent::seconds(7200.0).to_string(), "2h");
        assert_eq!(Extent::millis(500).to_string(), "500ms");
        assert_eq!(Extent::Samples(10).to_string(), "10");
        assert_eq!(WindowSpec::seconds(5.0, 2.5).to_string(), "w=5s_s=2.5s");
    }

    #[test]
    fn test_validate_rejects_bad_specs() {
        assert_eq!(
            WindowSpec::samples(0, 1).validate(),
            Err(WindowError::NonPositive { field: "length" })
        );
        assert_eq!(
            WindowSpec::span(3, -1).validate(),
            Err(WindowError::NonPositive { field: "stride" })
        );
        assert_eq!(
            WindowSpec::samples(3, 1).with_min_occupancy(0).validate(),
            Err(WindowError::ZeroOccupancy)
        );
        assert!(matches!(
            WindowSpec::new(Extent::Samples(3), Extent::Span(2)).validate(),
            Err(WindowError::MixedUnits { .. })
        ));
        assert!(WindowSpec::samples(3, 5).validate().is_ok());
    }

    #[test]
    fn test_extent_index_compatibility() {
        let spec = WindowSpec::seconds(5.0, 1.0);
        assert!(spec.check_index(IndexKind::WallClock).is_ok());
        assert!(spec.check_index(IndexKind::Offset).is_err());
        assert!(WindowSpec::samples(4, 2).check_index(IndexKind::WallClock).is_ok());
        assert!(WindowSpec::span(4, 2).check_index(IndexKind::WallClock).is_err());
    }
}
