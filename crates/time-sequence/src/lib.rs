//! Time-Indexed Sequences
//!
//! Provides read-only storage for timestamp-indexed numeric columns and the
//! borrowed views that window functions evaluate over.

mod error;
mod sequence;
mod set;

pub use error::SequenceError;
pub use sequence::{SequenceView, TimeSequence};
pub use set::SequenceSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of timestamp axis a sequence is indexed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Plain numeric offsets (sample numbers, seconds since start, ...)
    Offset,
    /// Wall-clock instants, stored as nanoseconds since the Unix epoch
    WallClock,
}

/// A point on a timestamp axis.
///
/// The raw tick value is interpreted according to the owning sequence's
/// [`IndexKind`]: offset units for `Offset`, epoch nanoseconds for `WallClock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Raw tick value
    pub fn ticks(self) -> i64 {
        self.0
    }

    /// Convert a wall-clock instant; `None` if it does not fit in epoch nanoseconds
    pub fn from_datetime(instant: DateTime<Utc>) -> Option<Self> {
        instant.timestamp_nanos_opt().map(Timestamp)
    }

    /// Interpret the ticks as epoch nanoseconds
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }

    /// Shift by a number of ticks, saturating at the axis bounds
    pub fn saturating_add(self, ticks: i64) -> Self {
        Timestamp(self.0.saturating_add(ticks))
    }
}

impl From<i64> for Timestamp {
    fn from(ticks: i64) -> Self {
        Timestamp(ticks)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_round_trip() {
        let instant = Utc.with_ymd_and_hms(2021, 3, 4, 12, 0, 5).unwrap();
        let ts = Timestamp::from_datetime(instant).unwrap();
        assert_eq!(ts.to_datetime(), instant);
    }

    #[test]
    fn test_saturating_add() {
        assert_eq!(Timestamp(i64::MAX - 1).saturating_add(10), Timestamp(i64::MAX));
        assert_eq!(Timestamp(5).saturating_add(-2), Timestamp(3));
    }
}
