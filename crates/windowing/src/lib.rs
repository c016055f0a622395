//! Window Iteration and Segmentation
//!
//! Turns a sequence index plus a [`WindowSpec`] into half-open windows, and
//! slices one or more aligned input sequences into per-window views.

mod error;
mod iter;
mod segment;
mod spec;

pub use error::WindowError;
pub use iter::{IterStats, Window, WindowFrame, WindowIter};
pub use segment::{Segment, SegmentStats, Segmenter};
pub use spec::{Extent, ExtentUnit, WindowAnchor, WindowSpec};
