//! Window Functions
//!
//! The capability every per-window aggregation implements, a closure wrapper
//! for ad-hoc functions, and a small library of built-in aggregations
//! expressed as plain parameter structs.

mod correlation;
mod error;
mod function;
mod quantiles;
mod spectral;
mod statistics;

pub use correlation::Correlation;
pub use error::FunctionError;
pub use function::{single_input, FuncWrapper, FunctionKind, WindowFunction};
pub use quantiles::Quantiles;
pub use spectral::{SpectralBands, SpectralFeatures};
pub use statistics::{Moments, Statistic, Statistics};
