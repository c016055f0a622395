//! Parallel Work Item Executor

use crate::error::{ConfigError, FunctionFailure};
use crate::progress::ProgressEvent;
use crate::{ExtractionConfig, FeatureDescriptor, Result, WorkItem};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::Instant;
use time_sequence::{SequenceView, Timestamp};
use tracing::{debug, warn};
use window_functions::{FunctionError, WindowFunction};
use windowing::{Window, WindowAnchor};

/// Values of one descriptor over one window; `None` marks an absent output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Window anchor timestamp (window end by default)
    pub timestamp: Timestamp,
    pub window: Window,
    /// One entry per output, in declared order
    pub values: Vec<Option<f64>>,
}

/// Per-descriptor results of a run
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// Rows per descriptor, each sorted by timestamp
    pub results: Vec<Vec<ResultRow>>,
    /// Failures recorded as absent rows
    pub failures: Vec<FunctionFailure>,
    /// Work items never started after a fail-fast abort
    pub aborted: usize,
}

enum Outcome {
    Values(Vec<f64>),
    Failed(FunctionError),
    Aborted,
}

/// Evaluates work items on a worker pool and collects ordered results
pub struct Executor<'d> {
    descriptors: &'d [FeatureDescriptor],
    arities: Vec<usize>,
    workers: usize,
    fail_fast: bool,
    anchor: WindowAnchor,
}

impl<'d> Executor<'d> {
    /// Create an executor for a validated descriptor table
    pub fn new(descriptors: &'d [FeatureDescriptor], config: &ExtractionConfig) -> Self {
        Self {
            descriptors,
            arities: descriptors.iter().map(|d| d.function().outputs().len()).collect(),
            workers: config.effective_workers(),
            fail_fast: config.fail_fast,
            anchor: config.window_anchor,
        }
    }

    /// Worker threads used; 1 runs in the calling thread
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Evaluate every item, reporting each to `progress` if given.
    ///
    /// Results do not depend on the worker count or completion order. Under
    /// fail-fast the earliest failure in item order is returned.
    pub fn run(
        &self,
        items: &[WorkItem<'_>],
        progress: Option<Sender<ProgressEvent>>,
    ) -> Result<ExecutionOutcome> {
        let abort = AtomicBool::new(false);

        let outcomes: Vec<Outcome> = if self.workers <= 1 {
            items
                .iter()
                .map(|item| self.evaluate(item, &abort, progress.as_ref()))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .map_err(|e| ConfigError::InvalidSetting {
                    field: "worker_count",
                    reason: e.to_string(),
                })?;
            pool.install(|| {
                items
                    .par_iter()
                    .map_with(progress.clone(), |tx, item| self.evaluate(item, &abort, tx.as_ref()))
                    .collect()
            })
        };
        drop(progress);

        self.collect(items, outcomes)
    }

    fn evaluate(
        &self,
        item: &WorkItem<'_>,
        abort: &AtomicBool,
        progress: Option<&Sender<ProgressEvent>>,
    ) -> Outcome {
        if abort.load(Ordering::Relaxed) {
            if let Some(tx) = progress {
                let _ = tx.send(ProgressEvent::Aborted {
                    descriptor: item.descriptor,
                });
            }
            return Outcome::Aborted;
        }

        let descriptor = &self.descriptors[item.descriptor];
        let started = Instant::now();
        let result = invoke(descriptor.function(), &item.slices, self.arities[item.descriptor]);
        let elapsed = started.elapsed();

        debug!(
            "Finished {} on {} with window-stride [{}, {}] over {} in {:?}",
            descriptor.function().name(),
            descriptor.inputs().join("|"),
            descriptor.window().length(),
            descriptor.window().stride(),
            item.window,
            elapsed
        );

        if result.is_err() && self.fail_fast {
            abort.store(true, Ordering::Relaxed);
        }
        if let Some(tx) = progress {
            let _ = tx.send(ProgressEvent::Completed {
                descriptor: item.descriptor,
                elapsed,
                failed: result.is_err(),
            });
        }

        match result {
            Ok(values) => Outcome::Values(values),
            Err(error) => Outcome::Failed(error),
        }
    }

    fn collect(&self, items: &[WorkItem<'_>], outcomes: Vec<Outcome>) -> Result<ExecutionOutcome> {
        let mut outcome = ExecutionOutcome {
            results: vec![Vec::new(); self.descriptors.len()],
            ..Default::default()
        };

        for (item, result) in items.iter().zip(outcomes) {
            let values = match result {
                Outcome::Values(values) => values
                    .into_iter()
                    .map(|v| if v.is_nan() { None } else { Some(v) })
                    .collect(),
                Outcome::Failed(error) => {
                    let failure = FunctionFailure {
                        descriptor: item.descriptor,
                        label: self.descriptors[item.descriptor].label(),
                        window: item.window,
                        error,
                    };
                    if self.fail_fast {
                        return Err(failure.into());
                    }
                    warn!("{}", failure);
                    outcome.failures.push(failure);
                    vec![None; self.arities[item.descriptor]]
                }
                Outcome::Aborted => {
                    outcome.aborted += 1;
                    continue;
                }
            };

            outcome.results[item.descriptor].push(ResultRow {
                timestamp: item.window.anchor(self.anchor),
                window: item.window,
                values,
            });
        }

        for rows in &mut outcome.results {
            rows.sort_by_key(|row| row.timestamp);
        }
        Ok(outcome)
    }
}

/// Call a function, turning panics and miscounted outputs into errors
fn invoke(
    function: &dyn WindowFunction,
    slices: &[SequenceView<'_>],
    arity: usize,
) -> std::result::Result<Vec<f64>, FunctionError> {
    let values = match panic::catch_unwind(AssertUnwindSafe(|| function.invoke(slices))) {
        Ok(result) => result?,
        Err(payload) => return Err(FunctionError::Panicked(panic_message(payload.as_ref()))),
    };
    if values.len() != arity {
        return Err(FunctionError::OutputArity {
            expected: arity,
            actual: values.len(),
        });
    }
    Ok(values)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
