//! Progress Reporting and Execution Statistics
//!
//! Workers never share counters. Each finished work item is reported as a
//! [`ProgressEvent`] over a channel to a single coordinator, which owns the
//! progress state, forwards it to an optional observer and aggregates
//! per-item timings once the run completes.

use crate::FeatureDescriptor;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tracing::info;

/// Message sent from a worker to the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A work item ran to completion or failure
    Completed {
        descriptor: usize,
        elapsed: Duration,
        failed: bool,
    },
    /// A work item was not started because the run is aborting
    Aborted { descriptor: usize },
}

/// Snapshot handed to a [`ProgressObserver`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressInfo {
    /// Work items finished so far (successful or failed)
    pub completed: usize,
    /// Work items whose function failed
    pub failed: usize,
    /// Work items skipped after a fail-fast abort
    pub aborted: usize,
    /// Work items in the run
    pub total: usize,
    /// Time since the run started executing
    pub elapsed: Duration,
}

impl ProgressInfo {
    /// Fraction of work items accounted for, in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed + self.aborted) as f64 / self.total as f64
        }
    }
}

/// Receives progress snapshots on the coordinator thread
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

/// Timing aggregate for one (key, window, stride) combination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    /// Function name or joined input columns
    pub key: String,
    pub window: String,
    pub stride: String,
    pub count: usize,
    pub sum: Duration,
    pub mean: Duration,
    /// Sample standard deviation
    pub std: Duration,
}

impl DurationStats {
    fn from_samples(key: String, window: String, stride: String, samples: &[f64]) -> Self {
        let count = samples.len();
        let sum: f64 = samples.iter().sum();
        let mean = if count > 0 { sum / count as f64 } else { 0.0 };
        let std = if count > 1 {
            let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };
        Self {
            key,
            window,
            stride,
            count,
            sum: Duration::from_secs_f64(sum),
            mean: Duration::from_secs_f64(mean),
            std: Duration::from_secs_f64(std),
        }
    }
}

/// Per-item execution timings of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionStats {
    /// Grouped by function, window and stride; slowest mean first
    pub by_function: Vec<DurationStats>,
    /// Grouped by input columns, window and stride; largest total first
    pub by_series: Vec<DurationStats>,
}

impl fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<32} {:>8} {:>8} {:>7} {:>12} {:>12}", "function", "window", "stride", "count", "mean", "sum")?;
        for s in &self.by_function {
            writeln!(
                f,
                "{:<32} {:>8} {:>8} {:>7} {:>12?} {:>12?}",
                s.key, s.window, s.stride, s.count, s.mean, s.sum
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:<32} {:>8} {:>8} {:>7} {:>12} {:>12}", "series", "window", "stride", "count", "mean", "sum")?;
        for s in &self.by_series {
            writeln!(
                f,
                "{:<32} {:>8} {:>8} {:>7} {:>12?} {:>12?}",
                s.key, s.window, s.stride, s.count, s.mean, s.sum
            )?;
        }
        Ok(())
    }
}

struct StatKey {
    function: String,
    series: String,
    window: String,
    stride: String,
}

/// Owns progress state for one run; fed by the workers' channel
pub(crate) struct Coordinator<'o> {
    keys: Vec<StatKey>,
    samples: Vec<Vec<f64>>,
    info: ProgressInfo,
    started: Instant,
    every: usize,
    observer: Option<&'o dyn ProgressObserver>,
}

impl<'o> Coordinator<'o> {
    pub(crate) fn new(
        descriptors: &[FeatureDescriptor],
        total: usize,
        every: usize,
        observer: Option<&'o dyn ProgressObserver>,
    ) -> Self {
        let keys = descriptors
            .iter()
            .map(|d| StatKey {
                function: d.function().name().to_string(),
                series: d.inputs().join("|"),
                window: d.window().length().to_string(),
                stride: d.window().stride().to_string(),
            })
            .collect();

        Self {
            keys,
            samples: vec![Vec::new(); descriptors.len()],
            info: ProgressInfo {
                total,
                ..Default::default()
            },
            started: Instant::now(),
            every,
            observer,
        }
    }

    fn record(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Completed {
                descriptor,
                elapsed,
                failed,
            } => {
                self.info.completed += 1;
                if failed {
                    self.info.failed += 1;
                }
                if let Some(samples) = self.samples.get_mut(descriptor) {
                    samples.push(elapsed.as_secs_f64());
                }
            }
            ProgressEvent::Aborted { .. } => self.info.aborted += 1,
        }
        self.info.elapsed = self.started.elapsed();

        let done = self.info.completed + self.info.aborted;
        if self.every > 0 && (done % self.every == 0 || done == self.info.total) {
            info!(
                "Progress: {}/{} work items ({:.1}%), {} failed",
                done,
                self.info.total,
                self.info.fraction() * 100.0,
                self.info.failed
            );
        }
        if let Some(observer) = self.observer {
            observer.on_progress(&self.info);
        }
    }

    /// Consume events until every sender is dropped, then aggregate timings
    pub(crate) fn drain(mut self, events: Receiver<ProgressEvent>) -> ExecutionStats {
        for event in events {
            self.record(event);
        }
        self.finish()
    }

    fn finish(self) -> ExecutionStats {
        let mut by_function: BTreeMap<(String, String, String), Vec<f64>> = BTreeMap::new();
        let mut by_series: BTreeMap<(String, String, String), Vec<f64>> = BTreeMap::new();

        for (key, samples) in self.keys.iter().zip(&self.samples) {
            if samples.is_empty() {
                continue;
            }
            by_function
                .entry((key.function.clone(), key.window.clone(), key.stride.clone()))
                .or_default()
                .extend(samples);
            by_series
                .entry((key.series.clone(), key.window.clone(), key.stride.clone()))
                .or_default()
                .extend(samples);
        }

        let collect = |groups: BTreeMap<(String, String, String), Vec<f64>>| -> Vec<DurationStats> {
            groups
                .into_iter()
                .map(|((key, window, stride), samples)| DurationStats::from_samples(key, window, stride, &samples))
                .collect()
        };

        let mut by_function = collect(by_function);
        by_function.sort_by(|a, b| b.mean.cmp(&a.mean));
        let mut by_series = collect(by_series);
        by_series.sort_by(|a, b| b.sum.cmp(&a.sum));

        ExecutionStats {
            by_function,
            by_series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use window_functions::{Statistic, Statistics};
    use windowing::WindowSpec;

    struct Recorder(Mutex<Vec<ProgressInfo>>);

    impl ProgressObserver for Recorder {
        fn on_progress(&self, info: &ProgressInfo) {
            self.0.lock().unwrap().push(info.clone());
        }
    }

    fn descriptors() -> Vec<FeatureDescriptor> {
        vec![
            FeatureDescriptor::new(Statistics::single(Statistic::Mean), ["a"], WindowSpec::samples(4, 2)),
            FeatureDescriptor::new(Statistics::single(Statistic::Mean), ["b"], WindowSpec::samples(4, 2)),
            FeatureDescriptor::new(Statistics::single(Statistic::Max), ["a"], WindowSpec::samples(4, 2)),
        ]
    }

    #[test]
    fn test_coordinator_counts_and_forwards() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        let descriptors = descriptors();
        let coordinator = Coordinator::new(&descriptors, 3, 0, Some(&recorder));

        let (tx, rx) = mpsc::channel();
        tx.send(ProgressEvent::Completed {
            descriptor: 0,
            elapsed: Duration::from_millis(2),
            failed: false,
        })
        .unwrap();
        tx.send(ProgressEvent::Completed {
            descriptor: 2,
            elapsed: Duration::from_millis(1),
            failed: true,
        })
        .unwrap();
        tx.send(ProgressEvent::Aborted { descriptor: 1 }).unwrap();
        drop(tx);

        let stats = coordinator.drain(rx);
        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 3);
        let last = seen.last().unwrap();
        assert_eq!((last.completed, last.failed, last.aborted), (2, 1, 1));
        assert_eq!(last.fraction(), 1.0);

        // Slowest function first
        assert_eq!(stats.by_function.len(), 2);
        assert_eq!(stats.by_function[0].key, "mean");
        assert_eq!(stats.by_function[0].window, "4");
        // Only series `a` recorded timings
        assert_eq!(stats.by_series.len(), 1);
        assert_eq!(stats.by_series[0].key, "a");
        assert_eq!(stats.by_series[0].count, 2);
    }

    #[test]
    fn test_duration_stats() {
        let s = DurationStats::from_samples("f".into(), "4".into(), "2".into(), &[1.0, 3.0]);
        assert_eq!(s.count, 2);
        assert_eq!(s.sum, Duration::from_secs(4));
        assert_eq!(s.mean, Duration::from_secs(2));
        assert!((s.std.as_secs_f64() - 2f64.sqrt()).abs() < 1e-6);
    }
}
