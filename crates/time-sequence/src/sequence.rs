//! Time Sequence Storage and Views

use crate::{IndexKind, SequenceError, Timestamp};
use chrono::{DateTime, Utc};
use std::ops::Range;
use std::sync::Arc;

/// A named numeric column on a strictly increasing timestamp axis.
///
/// Values may be absent (`None`), timestamps may not. The index is shared
/// behind an `Arc` so several columns recorded on the same axis do not copy it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSequence {
    name: String,
    kind: IndexKind,
    index: Arc<[Timestamp]>,
    values: Vec<Option<f64>>,
    /// `present[i]` = number of non-absent values before position `i`
    present: Vec<usize>,
}

impl TimeSequence {
    /// Create a sequence, checking length agreement and strict monotonicity
    pub fn new(
        name: impl Into<String>,
        kind: IndexKind,
        index: impl Into<Arc<[Timestamp]>>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, SequenceError> {
        let name = name.into();
        let index = index.into();

        if index.len() != values.len() {
            return Err(SequenceError::LengthMismatch {
                name,
                index_len: index.len(),
                values_len: values.len(),
            });
        }

        if let Some(position) = index.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(SequenceError::NonMonotonicIndex {
                name,
                position: position + 1,
            });
        }

        let mut present = Vec::with_capacity(values.len() + 1);
        let mut count = 0;
        present.push(count);
        for value in &values {
            if value.is_some() {
                count += 1;
            }
            present.push(count);
        }

        Ok(Self {
            name,
            kind,
            index,
            values,
            present,
        })
    }

    /// Sequence on a numeric offset axis; NaN values are treated as absent
    pub fn offsets(
        name: impl Into<String>,
        index: Vec<i64>,
        values: Vec<f64>,
    ) -> Result<Self, SequenceError> {
        let index: Vec<Timestamp> = index.into_iter().map(Timestamp).collect();
        Self::new(name, IndexKind::Offset, index, nan_as_absent(values))
    }

    /// Sequence on a wall-clock axis; NaN values are treated as absent
    pub fn wall_clock(
        name: impl Into<String>,
        index: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> Result<Self, SequenceError> {
        let name = name.into();
        let mut ticks = Vec::with_capacity(index.len());
        for (position, instant) in index.into_iter().enumerate() {
            match Timestamp::from_datetime(instant) {
                Some(ts) => ticks.push(ts),
                None => return Err(SequenceError::TimestampOutOfRange { name, position }),
            }
        }
        Self::new(name, IndexKind::WallClock, ticks, nan_as_absent(values))
    }

    /// Sequence name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of timestamp axis
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Number of samples (present or absent)
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the sequence has no samples
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Timestamp axis
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    /// Shared handle to the timestamp axis
    pub fn shared_index(&self) -> Arc<[Timestamp]> {
        Arc::clone(&self.index)
    }

    /// Value column
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// First timestamp, if any
    pub fn first(&self) -> Option<Timestamp> {
        self.index.first().copied()
    }

    /// Last timestamp, if any
    pub fn last(&self) -> Option<Timestamp> {
        self.index.last().copied()
    }

    /// Count of non-absent values in a position range (clipped to the sequence)
    pub fn occupancy(&self, positions: Range<usize>) -> usize {
        let end = positions.end.min(self.len());
        let start = positions.start.min(end);
        self.present[end] - self.present[start]
    }

    /// Borrow the samples in a position range (clipped to the sequence)
    pub fn view(&self, positions: Range<usize>) -> SequenceView<'_> {
        let end = positions.end.min(self.len());
        let start = positions.start.min(end);
        SequenceView {
            name: &self.name,
            kind: self.kind,
            offset: start,
            index: &self.index[start..end],
            values: &self.values[start..end],
            present: &self.present[start..=end],
        }
    }

    /// Borrow the whole sequence
    pub fn full_view(&self) -> SequenceView<'_> {
        self.view(0..self.len())
    }

    /// First position at or after `from` whose timestamp is `>= bound`.
    ///
    /// Scans forward from `from`, so callers advancing a monotone bound pay
    /// amortized constant time per step.
    pub fn seek(&self, from: usize, bound: Timestamp) -> usize {
        let mut position = from.min(self.len());
        while position < self.len() && self.index[position] < bound {
            position += 1;
        }
        position
    }

    /// Position range covering timestamps in `[start, end)`
    pub fn range_of(&self, start: Timestamp, end: Timestamp) -> Range<usize> {
        let lo = self.index.partition_point(|ts| *ts < start);
        let hi = self.index.partition_point(|ts| *ts < end).max(lo);
        lo..hi
    }
}

fn nan_as_absent(values: Vec<f64>) -> Vec<Option<f64>> {
    values
        .into_iter()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .collect()
}

/// Borrowed, read-only slice of a [`TimeSequence`]
#[derive(Debug, Clone, Copy)]
pub struct SequenceView<'a> {
    name: &'a str,
    kind: IndexKind,
    offset: usize,
    index: &'a [Timestamp],
    values: &'a [Option<f64>],
    present: &'a [usize],
}

impl<'a> SequenceView<'a> {
    /// Name of the underlying sequence
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Kind of timestamp axis
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Position of the first sample within the underlying sequence
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of samples (present or absent)
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the view holds no samples
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Timestamps covered by the view
    pub fn index(&self) -> &'a [Timestamp] {
        self.index
    }

    /// Values covered by the view, absent markers included
    pub fn values(&self) -> &'a [Option<f64>] {
        self.values
    }

    /// Count of non-absent values
    pub fn occupancy(&self) -> usize {
        self.present[self.present.len() - 1] - self.present[0]
    }

    /// Iterate the non-absent values in order
    pub fn present(&self) -> impl Iterator<Item = f64> + 'a {
        self.values.iter().filter_map(|v| *v)
    }

    /// Collect the non-absent values
    pub fn present_values(&self) -> Vec<f64> {
        self.present().collect()
    }

    /// Iterate `(timestamp, value)` pairs for non-absent values
    pub fn samples(&self) -> impl Iterator<Item = (Timestamp, f64)> + 'a {
        self.index
            .iter()
            .zip(self.values.iter())
            .filter_map(|(ts, v)| v.map(|v| (*ts, v)))
    }
}
