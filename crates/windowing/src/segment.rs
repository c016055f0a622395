//! Multi-Input Segmenter
//!
//! Window boundaries come from a single primary input; every other input is
//! sliced by the same `[start, end)` timestamp range so a function always
//! sees temporally aligned views.

use crate::{IterStats, Window, WindowError, WindowIter, WindowSpec};
use time_sequence::{SequenceView, TimeSequence};
use tracing::trace;

/// Aligned views of every input for one window
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    pub window: Window,
    /// One view per input, in input order
    pub slices: Vec<SequenceView<'a>>,
}

/// Counters gathered while segmenting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStats {
    /// Primary window iterator counters
    pub windows: IterStats,
    /// Windows dropped because a secondary input had no samples in range
    pub uncovered: usize,
    /// Windows dropped because a secondary input fell below the occupancy threshold
    pub underfilled: usize,
}

impl SegmentStats {
    /// Windows yielded as segments
    pub fn segments(&self) -> usize {
        self.windows.emitted - self.uncovered - self.underfilled
    }

    /// Windows dropped for any reason
    pub fn dropped(&self) -> usize {
        self.windows.skipped + self.uncovered + self.underfilled
    }
}

/// Lazy iterator of aligned segments over one or more inputs
#[derive(Debug, Clone)]
pub struct Segmenter<'a> {
    windows: WindowIter<'a>,
    inputs: Vec<&'a TimeSequence>,
    primary: usize,
    cursors: Vec<(usize, usize)>,
    uncovered: usize,
    underfilled: usize,
}

impl<'a> Segmenter<'a> {
    /// Create a segmenter whose windows follow `inputs[primary]`
    pub fn new(
        inputs: Vec<&'a TimeSequence>,
        primary: usize,
        spec: &WindowSpec,
        default_min_occupancy: usize,
    ) -> Result<Self, WindowError> {
        if inputs.is_empty() {
            return Err(WindowError::EmptyInputs);
        }
        let lead = *inputs.get(primary).ok_or(WindowError::PrimaryOutOfRange {
            primary,
            inputs: inputs.len(),
        })?;

        if let Some(other) = inputs.iter().find(|input| input.kind() != lead.kind()) {
            return Err(WindowError::IndexKindMismatch {
                primary: lead.name().to_string(),
                other: other.name().to_string(),
            });
        }

        let windows = WindowIter::new(lead, spec, default_min_occupancy)?;
        let cursors = vec![(0, 0); inputs.len()];

        Ok(Self {
            windows,
            inputs,
            primary,
            cursors,
            uncovered: 0,
            underfilled: 0,
        })
    }

    /// Counters so far
    pub fn stats(&self) -> SegmentStats {
        SegmentStats {
            windows: self.windows.stats(),
            uncovered: self.uncovered,
            underfilled: self.underfilled,
        }
    }

    /// Rewind to the first window
    pub fn reset(&mut self) {
        self.windows.reset();
        self.cursors.iter_mut().for_each(|c| *c = (0, 0));
        self.uncovered = 0;
        self.underfilled = 0;
    }
}

impl<'a> Iterator for Segmenter<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let min_occupancy = self.windows.min_occupancy();

        'windows: loop {
            let frame = self.windows.next()?;
            let mut slices = Vec::with_capacity(self.inputs.len());

            for (position, input) in self.inputs.iter().enumerate() {
                if position == self.primary {
                    slices.push(input.view(frame.rows.clone()));
                    continue;
                }

                let (left, right) = &mut self.cursors[position];
                *left = input.seek(*left, frame.window.start);
                *right = input.seek((*right).max(*left), frame.window.end);
                let view = input.view(*left..*right);

                if view.is_empty() {
                    trace!("{} does not cover {}", input.name(), frame.window);
                    self.uncovered += 1;
                    continue 'windows;
                }
                if view.occupancy() < min_occupancy {
                    self.underfilled += 1;
                    continue 'windows;
                }
                slices.push(view);
            }

            return Some(Segment {
                window: frame.window,
                slices,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time_sequence::{IndexKind, Timestamp};

    fn seq(name: &str, ticks: Vec<i64>) -> TimeSequence {
        let values = ticks.iter().map(|t| *t as f64).collect();
        TimeSequence::offsets(name, ticks, values).unwrap()
    }

    #[test]
    fn test_single_input_matches_window_iterator() {
        let a = seq("a", (0..10).collect());
        let spec = WindowSpec::samples(3, 2).with_min_occupancy(3);
        let mut segmenter = Segmenter::new(vec![&a], 0, &spec, 1).unwrap();
        let segments: Vec<_> = segmenter.by_ref().collect();

        assert_eq!(segments.len(), 4);
        assert_eq!(segmenter.stats().segments(), 4);
        assert_eq!(segmenter.stats().dropped(), 1);
        assert_eq!(segments[2].slices[0].present_values(), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_inputs_sliced_by_same_time_range() {
        let a = seq("a", (0..20).collect());
        // Half the sampling rate of `a`
        let b = seq("b", (0..20).step_by(2).collect());
        let spec = WindowSpec::span(4, 4);
        let segments: Vec<_> = Segmenter::new(vec![&a, &b], 0, &spec, 1).unwrap().collect();

        assert_eq!(segments.len(), 5);
        for segment in &segments {
            for slice in &segment.slices {
                assert!(slice.index().iter().all(|ts| segment.window.contains(*ts)));
            }
            assert_eq!(segment.slices[0].len(), 4);
            assert_eq!(segment.slices[1].len(), 2);
        }
    }

    #[test]
    fn test_uncovered_windows_are_skipped() {
        let a = seq("a", (0..10).collect());
        let b = seq("b", vec![4, 5, 6]);
        let spec = WindowSpec::span(2, 2);
        let mut segmenter = Segmenter::new(vec![&a, &b], 0, &spec, 1).unwrap();
        let starts: Vec<_> = segmenter.by_ref().map(|s| s.window.start).collect();

        assert_eq!(starts, vec![Timestamp(4), Timestamp(6)]);
        assert_eq!(segmenter.stats().uncovered, 3);
    }

    #[test]
    fn test_reset_rewinds_every_input() {
        let a = seq("a", (0..10).collect());
        let b = seq("b", vec![4, 5, 6]);
        let spec = WindowSpec::span(2, 2);
        let mut segmenter = Segmenter::new(vec![&a, &b], 0, &spec, 1).unwrap();
        fn bounds(segmenter: &mut Segmenter<'_>) -> Vec<(Timestamp, usize)> {
            segmenter
                .by_ref()
                .map(|s| (s.window.start, s.slices[1].len()))
                .collect()
        }

        let first = bounds(&mut segmenter);
        segmenter.reset();
        assert_eq!(segmenter.stats().uncovered, 0);
        let second = bounds(&mut segmenter);

        assert_eq!(first, second);
        assert_eq!(first, vec![(Timestamp(4), 2), (Timestamp(6), 1)]);
        assert_eq!(segmenter.stats().uncovered, 3);
    }

    #[test]
    fn test_secondary_occupancy_enforced() {
        let a = seq("a", (0..8).collect());
        let b = seq("b", vec![0, 1, 4]);
        let spec = WindowSpec::span(4, 4).with_min_occupancy(2);
        let mut segmenter = Segmenter::new(vec![&a, &b], 0, &spec, 1).unwrap();
        let segments: Vec<_> = segmenter.by_ref().collect();

        assert_eq!(segments.len(), 1);
        assert_eq!(segmenter.stats().underfilled, 1);
    }

    #[test]
    fn test_primary_other_than_first() {
        let dense = seq("dense", (0..12).collect());
        let sparse = seq("sparse", vec![0, 6]);
        let spec = WindowSpec::samples(1, 1);
        let segments: Vec<_> = Segmenter::new(vec![&dense, &sparse], 1, &spec, 1)
            .unwrap()
            .collect();

        // Windows follow the sparse input: [0, 6) and [6, 12)
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].slices[0].len(), 6);
        assert_eq!(segments[1].slices[0].len(), 6);
    }

    #[test]
    fn test_rejects_mixed_index_kinds() {
        let a = seq("a", vec![0, 1]);
        let b = TimeSequence::new(
            "b",
            IndexKind::WallClock,
            vec![Timestamp(0), Timestamp(1)],
            vec![Some(1.0), Some(2.0)],
        )
        .unwrap();
        let err = Segmenter::new(vec![&a, &b], 0, &WindowSpec::samples(1, 1), 1).unwrap_err();
        assert!(matches!(err, WindowError::IndexKindMismatch { .. }));
    }
}
