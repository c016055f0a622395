//! Windowed Feature Extraction Engine
//!
//! Validates a table of feature descriptors against named time sequences,
//! segments every input into windows, evaluates the bound window functions
//! across a worker pool and merges the per-descriptor results into one
//! timestamp-indexed table.

mod collection;
mod descriptor;
mod error;
mod executor;
pub mod merger;
mod progress;
mod settings;
mod table;
mod telemetry;
mod validation;
mod work;

pub use collection::{Extraction, FeatureCollection, RunReport, SeparateExtraction};
pub use descriptor::{FeatureDescriptor, FeatureGrid};
pub use error::{ConfigError, FeatureError, FunctionFailure, Result, SchemaError};
pub use executor::{ExecutionOutcome, Executor, ResultRow};
pub use merger::merge;
pub use progress::{DurationStats, ExecutionStats, ProgressEvent, ProgressInfo, ProgressObserver};
pub use settings::{ExtractionConfig, ENV_PREFIX};
pub use table::{Column, OutputTable};
pub use telemetry::init_logging;
pub use validation::validate;
pub use work::{segment, DescriptorGroup, WorkItem};
