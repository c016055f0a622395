//! Window Iterator
//!
//! Count mode steps over sample positions; time mode steps over the
//! timestamp axis and locates each window's rows with two forward-only
//! cursors, so a full pass costs time linear in the index length.

use crate::{Extent, WindowAnchor, WindowError, WindowSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use time_sequence::{TimeSequence, Timestamp};

/// Half-open timestamp interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Window {
    /// Timestamp labelling this window for the given anchor
    pub fn anchor(&self, anchor: WindowAnchor) -> Timestamp {
        match anchor {
            WindowAnchor::Begin => self.start,
            WindowAnchor::End => self.end,
            WindowAnchor::Middle => {
                let half = (self.end.ticks() as i128 - self.start.ticks() as i128) / 2;
                Timestamp((self.start.ticks() as i128 + half) as i64)
            }
        }
    }

    /// Check whether a timestamp falls inside the window
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts < self.end
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A window together with the rows of the iterated sequence it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFrame {
    pub window: Window,
    /// Clipped row positions inside the sequence
    pub rows: Range<usize>,
    /// Present samples inside `rows`
    pub occupancy: usize,
}

/// Counters gathered while iterating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterStats {
    /// Windows yielded
    pub emitted: usize,
    /// Windows skipped for insufficient occupancy
    pub skipped: usize,
    /// Smallest row count among time windows lying inside the index span
    pub interior_min: Option<usize>,
    /// Largest row count among time windows lying inside the index span
    pub interior_max: Option<usize>,
}

impl IterStats {
    /// Interior time windows held differing row counts, i.e. the index has gaps
    pub fn has_gaps(&self) -> bool {
        matches!((self.interior_min, self.interior_max), (Some(lo), Some(hi)) if lo != hi)
    }

    fn record_interior(&mut self, rows: usize) {
        self.interior_min = Some(self.interior_min.map_or(rows, |m| m.min(rows)));
        self.interior_max = Some(self.interior_max.map_or(rows, |m| m.max(rows)));
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Count { length: usize, stride: usize },
    Time { length: i64, stride: i64 },
}

/// Lazy, restartable iterator over the windows of one sequence
#[derive(Debug, Clone)]
pub struct WindowIter<'a> {
    sequence: &'a TimeSequence,
    mode: Mode,
    min_occupancy: usize,
    step: usize,
    left: usize,
    right: usize,
    finished: bool,
    stats: IterStats,
}

impl<'a> WindowIter<'a> {
    /// Create an iterator; `default_min_occupancy` applies when the window spec sets none
    pub fn new(
        sequence: &'a TimeSequence,
        spec: &WindowSpec,
        default_min_occupancy: usize,
    ) -> Result<Self, WindowError> {
        spec.validate()?;
        spec.check_index(sequence.kind())?;

        let min_occupancy = spec.min_occupancy_or(default_min_occupancy);
        if min_occupancy == 0 {
            return Err(WindowError::ZeroOccupancy);
        }

        let mode = match (spec.length(), spec.stride()) {
            (Extent::Samples(length), Extent::Samples(stride)) => Mode::Count { length, stride },
            (Extent::Span(length), Extent::Span(stride))
            | (Extent::Time(length), Extent::Time(stride)) => Mode::Time { length, stride },
            (length, stride) => {
                return Err(WindowError::MixedUnits {
                    length: length.unit(),
                    stride: stride.unit(),
                })
            }
        };

        Ok(Self {
            sequence,
            mode,
            min_occupancy,
            step: 0,
            left: 0,
            right: 0,
            finished: sequence.is_empty(),
            stats: IterStats::default(),
        })
    }

    /// Rewind to the first window
    pub fn reset(&mut self) {
        self.step = 0;
        self.left = 0;
        self.right = 0;
        self.finished = self.sequence.is_empty();
        self.stats = IterStats::default();
    }

    /// Counters so far
    pub fn stats(&self) -> IterStats {
        self.stats
    }

    /// Minimum occupancy in effect
    pub fn min_occupancy(&self) -> usize {
        self.min_occupancy
    }

    /// Timestamp at a (possibly past-the-end) row position.
    ///
    /// Positions past the last row are extrapolated with the final sampling
    /// interval, one tick when the sequence has a single row.
    fn timestamp_at(&self, position: usize) -> Timestamp {
        let index = self.sequence.index();
        if position < index.len() {
            return index[position];
        }
        let last = index.len() - 1;
        let interval = if last > 0 {
            index[last].ticks() - index[last - 1].ticks()
        } else {
            1
        };
        let beyond = i64::try_from(position - last).unwrap_or(i64::MAX);
        index[last].saturating_add(interval.saturating_mul(beyond))
    }

    fn next_count(&mut self, length: usize, stride: usize) -> Option<WindowFrame> {
        let len = self.sequence.len();
        loop {
            let start = match self.step.checked_mul(stride) {
                Some(start) if start < len => start,
                _ => {
                    self.finished = true;
                    return None;
                }
            };
            self.step += 1;

            let nominal_end = start.saturating_add(length);
            let rows = start..nominal_end.min(len);
            let occupancy = self.sequence.occupancy(rows.clone());
            if occupancy < self.min_occupancy {
                self.stats.skipped += 1;
                continue;
            }

            self.stats.emitted += 1;
            return Some(WindowFrame {
                window: Window {
                    start: self.sequence.index()[start],
                    end: self.timestamp_at(nominal_end),
                },
                rows,
                occupancy,
            });
        }
    }

    fn next_time(&mut self, length: i64, stride: i64) -> Option<WindowFrame> {
        let (first, last) = match (self.sequence.first(), self.sequence.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                self.finished = true;
                return None;
            }
        };

        loop {
            let offset = i64::try_from(self.step)
                .ok()
                .and_then(|step| step.checked_mul(stride));
            let start = match offset.and_then(|o| first.ticks().checked_add(o)) {
                Some(ticks) if ticks <= last.ticks() => Timestamp(ticks),
                _ => {
                    self.finished = true;
                    return None;
                }
            };
            let end = start.saturating_add(length);

            self.left = self.sequence.seek(self.left, start);
            self.right = self.sequence.seek(self.right.max(self.left), end);
            let rows = self.left..self.right;
            if end <= last {
                self.stats.record_interior(rows.len());
            }

            let occupancy = self.sequence.occupancy(rows.clone());
            if occupancy < self.min_occupancy {
                self.stats.skipped += 1;
                self.step += 1;
                if rows.is_empty() {
                    self.skip_empty_run(first, length, stride);
                }
                continue;
            }

            self.step += 1;
            self.stats.emitted += 1;
            return Some(WindowFrame {
                window: Window { start, end },
                rows,
                occupancy,
            });
        }
    }

    /// Jump over windows that would end before the next sample
    fn skip_empty_run(&mut self, first: Timestamp, length: i64, stride: i64) {
        let Some(&next) = self.sequence.index().get(self.left) else {
            return;
        };
        let lead = next.ticks() as i128 - first.ticks() as i128 - length as i128;
        if lead < 0 {
            return;
        }
        let target = usize::try_from(lead / stride as i128 + 1).unwrap_or(usize::MAX);
        if target > self.step {
            let jumped = target - self.step;
            self.stats.skipped += jumped;
            self.stats.record_interior(0);
            self.step = target;
        }
    }
}

impl<'a> Iterator for WindowIter<'a> {
    type Item = WindowFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.mode {
            Mode::Count { length, stride } => self.next_count(length, stride),
            Mode::Time { length, stride } => self.next_time(length, stride),
        }
    }
}
