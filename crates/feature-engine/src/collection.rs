//! Feature Collection
//!
//! The descriptor table of a run and the entry point that validates it,
//! segments every input, executes the work items and merges the results.

use crate::executor::{Executor, ResultRow};
use crate::progress::{Coordinator, ExecutionStats, ProgressObserver};
use crate::work::{report_sparsity, DescriptorGroup};
use crate::{
    merger, validation, ExtractionConfig, FeatureDescriptor, FeatureError, FeatureGrid, FunctionFailure,
    OutputTable, Result,
};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use time_sequence::{IndexKind, SequenceSet};
use tracing::{debug, info};

/// Summary of one extraction run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Worker threads used; 1 means the calling thread
    pub worker_count: usize,
    /// Work items scheduled
    pub work_items: usize,
    /// Descriptor windows dropped for occupancy or coverage
    pub skipped_windows: usize,
    /// Function failures recorded as absent results
    pub failures: Vec<FunctionFailure>,
    /// Work items never started after a fail-fast abort
    pub aborted: usize,
    /// Duration windowings over gapped sequences
    pub sparse_groups: usize,
    /// Per-item timing aggregates
    pub stats: ExecutionStats,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

/// Merged result of a run
#[derive(Debug, Clone)]
pub struct Extraction {
    pub table: OutputTable,
    pub report: RunReport,
}

/// Per-descriptor results of a run
#[derive(Debug, Clone)]
pub struct SeparateExtraction {
    /// One table per descriptor, in declaration order
    pub tables: Vec<OutputTable>,
    pub report: RunReport,
}

/// Ordered set of feature descriptors
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    descriptors: Vec<FeatureDescriptor>,
}

impl FeatureCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor
    pub fn add(&mut self, descriptor: FeatureDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Append every descriptor of a grid
    pub fn add_grid(&mut self, grid: &FeatureGrid) -> &mut Self {
        self.descriptors.extend(grid.expand());
        self
    }

    /// Append every descriptor of another collection
    pub fn add_collection(&mut self, other: &FeatureCollection) -> &mut Self {
        self.descriptors.extend(other.descriptors.iter().cloned());
        self
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> &[FeatureDescriptor] {
        &self.descriptors
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Output column names in declaration order
    pub fn output_names(&self) -> Vec<String> {
        self.descriptors.iter().flat_map(|d| d.output_names()).collect()
    }

    /// Sorted, distinct input columns the collection reads
    pub fn required_series(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .flat_map(|d| d.inputs().iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Descriptors sharing inputs, window spec and primary column
    pub fn groups(&self) -> Vec<DescriptorGroup> {
        DescriptorGroup::group(&self.descriptors)
    }

    /// Check the table against the inputs without running anything
    pub fn validate(&self, sequences: &SequenceSet, config: &ExtractionConfig) -> Result<()> {
        validation::validate(&self.descriptors, sequences, config)
    }

    /// Run every descriptor and merge the results into one table
    pub fn calculate(&self, sequences: &SequenceSet, config: &ExtractionConfig) -> Result<Extraction> {
        let (results, report) = self.run(sequences, config, None)?;
        let table = merger::merge(&self.descriptors, &results, self.axis(sequences))?;
        Ok(Extraction { table, report })
    }

    /// [`calculate`](Self::calculate), forwarding progress to `observer`
    pub fn calculate_with_observer(
        &self,
        sequences: &SequenceSet,
        config: &ExtractionConfig,
        observer: &dyn ProgressObserver,
    ) -> Result<Extraction> {
        let (results, report) = self.run(sequences, config, Some(observer))?;
        let table = merger::merge(&self.descriptors, &results, self.axis(sequences))?;
        Ok(Extraction { table, report })
    }

    /// Run every descriptor, returning one table per descriptor
    pub fn calculate_separate(
        &self,
        sequences: &SequenceSet,
        config: &ExtractionConfig,
    ) -> Result<SeparateExtraction> {
        let (results, report) = self.run(sequences, config, None)?;
        let tables = merger::split(&self.descriptors, &results, self.axis(sequences))?;
        Ok(SeparateExtraction { tables, report })
    }

    /// Index kind of the result axis
    fn axis(&self, sequences: &SequenceSet) -> IndexKind {
        self.descriptors
            .first()
            .and_then(|d| d.inputs().get(d.primary_position().unwrap_or(0)))
            .and_then(|column| sequences.get(column))
            .map_or(IndexKind::Offset, |s| s.kind())
    }

    fn run(
        &self,
        sequences: &SequenceSet,
        config: &ExtractionConfig,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<(Vec<Vec<ResultRow>>, RunReport)> {
        let started = Instant::now();
        self.validate(sequences, config)?;

        let mut items = Vec::new();
        let mut report = RunReport::default();
        for group in self.groups() {
            let (group_items, stats) = group.segment(sequences, config.min_occupancy)?;
            report.skipped_windows += stats.dropped() * group.members.len();
            if report_sparsity(&group, &stats, config.approve_sparsity) {
                report.sparse_groups += 1;
            }
            items.extend(group_items);
        }

        let executor = Executor::new(&self.descriptors, config);
        report.worker_count = executor.workers();
        report.work_items = items.len();
        info!(
            "Extracting {} descriptors over {} work items with {} worker(s)",
            self.descriptors.len(),
            items.len(),
            executor.workers()
        );

        let coordinator = Coordinator::new(&self.descriptors, items.len(), config.progress_every, observer);
        let (tx, rx) = mpsc::channel();
        let (outcome, stats) = thread::scope(|scope| {
            let progress = scope.spawn(move || coordinator.drain(rx));
            let outcome = executor.run(&items, Some(tx));
            (outcome, progress.join())
        });
        let stats = stats.map_err(|_| FeatureError::Internal("progress coordinator panicked".to_string()))?;
        let outcome = outcome?;

        report.failures = outcome.failures;
        report.aborted = outcome.aborted;
        report.stats = stats;
        report.elapsed = started.elapsed();

        info!(
            "Extracted {} outputs in {:?} ({} failures, {} windows skipped)",
            self.output_names().len(),
            report.elapsed,
            report.failures.len(),
            report.skipped_windows
        );
        debug!("Execution times:\n{}", report.stats);

        Ok((outcome.results, report))
    }
}

impl From<Vec<FeatureDescriptor>> for FeatureCollection {
    fn from(descriptors: Vec<FeatureDescriptor>) -> Self {
        Self { descriptors }
    }
}

impl From<FeatureDescriptor> for FeatureCollection {
    fn from(descriptor: FeatureDescriptor) -> Self {
        Self {
            descriptors: vec![descriptor],
        }
    }
}

impl From<FeatureGrid> for FeatureCollection {
    fn from(grid: FeatureGrid) -> Self {
        Self {
            descriptors: grid.expand(),
        }
    }
}

impl FromIterator<FeatureDescriptor> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = FeatureDescriptor>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

impl Extend<FeatureDescriptor> for FeatureCollection {
    fn extend<I: IntoIterator<Item = FeatureDescriptor>>(&mut self, iter: I) {
        self.descriptors.extend(iter);
    }
}

impl fmt::Display for FeatureCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in self.groups() {
            writeln!(f, "{}: {} (primary {})", group.inputs.join("|"), group.window, group.inputs[group.primary])?;
            for &member in &group.members {
                let descriptor = &self.descriptors[member];
                writeln!(
                    f,
                    "    {} -> {}",
                    descriptor.function().name(),
                    descriptor.output_names().join(", ")
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time_sequence::TimeSequence;
    use window_functions::{Correlation, Quantiles, Statistic, Statistics};
    use windowing::{Extent, WindowSpec};

    fn collection() -> FeatureCollection {
        let mut collection = FeatureCollection::new();
        collection
            .add(FeatureDescriptor::new(Correlation, ["TMP", "EDA"], WindowSpec::samples(4, 2)))
            .add_grid(
                &FeatureGrid::new()
                    .function(Statistics::single(Statistic::Mean))
                    .input("EDA")
                    .lengths([Extent::samples(4)])
                    .strides([Extent::samples(2)]),
            );
        collection
    }

    #[test]
    fn test_required_series_sorted_and_distinct() {
        assert_eq!(collection().required_series(), vec!["EDA", "TMP"]);
    }

    #[test]
    fn test_collections_compose() {
        let mut merged = FeatureCollection::from(FeatureDescriptor::new(
            Quantiles::new([0.5]),
            ["ACC"],
            WindowSpec::samples(8, 8),
        ));
        merged.add_collection(&collection());
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.output_names()[0], "ACC__q_0.5__w=8_s=8");
    }

    #[test]
    fn test_display_lists_groups() {
        let text = collection().to_string();
        assert!(text.contains("TMP|EDA: w=4_s=2 (primary TMP)"));
        assert!(text.contains("mean -> EDA__mean__w=4_s=2"));
    }

    #[test]
    fn test_calculate_small_run() {
        let sequences = SequenceSet::new()
            .with(TimeSequence::offsets("EDA", (0..10).collect(), (0..10).map(|v| v as f64).collect()).unwrap())
            .unwrap()
            .with(TimeSequence::offsets("TMP", (0..10).collect(), (0..10).map(|v| 2.0 * v as f64).collect()).unwrap())
            .unwrap();
        let extraction = collection()
            .calculate(&sequences, &ExtractionConfig::default().with_worker_count(Some(2)))
            .unwrap();

        let table = &extraction.table;
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.get("EDA__mean__w=4_s=2", time_sequence::Timestamp(4)), Some(1.5));
        let corr = table.column("TMP|EDA__corr__w=4_s=2").unwrap();
        assert!(corr.values.iter().flatten().all(|c| (c - 1.0).abs() < 1e-9));
        assert_eq!(extraction.report.worker_count, 2);
        assert!(extraction.report.failures.is_empty());
    }
}
