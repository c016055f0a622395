//! Work Items
//!
//! A work item is one descriptor evaluated over one window. Descriptors that
//! share inputs, window spec and primary column are segmented together, so
//! each distinct windowing is computed once.

use crate::{FeatureDescriptor, FeatureError, Result};
use time_sequence::{SequenceSet, SequenceView, TimeSequence};
use tracing::{debug, warn};
use windowing::{SegmentStats, Segmenter, Window, WindowSpec};

/// One descriptor over one window, with borrowed input slices
#[derive(Debug, Clone)]
pub struct WorkItem<'a> {
    /// Position of the descriptor in declaration order
    pub descriptor: usize,
    pub window: Window,
    /// Aligned input views, in the descriptor's input order
    pub slices: Vec<SequenceView<'a>>,
}

/// Descriptors sharing one windowing of the same inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorGroup {
    pub inputs: Vec<String>,
    pub window: WindowSpec,
    /// Position of the column driving the windows within `inputs`
    pub primary: usize,
    /// Member descriptor positions, in declaration order
    pub members: Vec<usize>,
}

impl DescriptorGroup {
    /// Group descriptors by (inputs, window spec, primary), keeping first-seen order
    pub fn group(descriptors: &[FeatureDescriptor]) -> Vec<DescriptorGroup> {
        let mut groups: Vec<DescriptorGroup> = Vec::new();
        for (position, descriptor) in descriptors.iter().enumerate() {
            let primary = descriptor.primary_position().unwrap_or(0);
            let existing = groups.iter_mut().find(|g| {
                g.inputs == descriptor.inputs() && g.window == *descriptor.window() && g.primary == primary
            });
            match existing {
                Some(group) => group.members.push(position),
                None => groups.push(DescriptorGroup {
                    inputs: descriptor.inputs().to_vec(),
                    window: *descriptor.window(),
                    primary,
                    members: vec![position],
                }),
            }
        }
        groups
    }

    /// Segment the group's inputs, emitting one work item per member and window
    pub fn segment<'a>(
        &self,
        sequences: &'a SequenceSet,
        default_min_occupancy: usize,
    ) -> Result<(Vec<WorkItem<'a>>, SegmentStats)> {
        let inputs = self
            .inputs
            .iter()
            .map(|column| {
                sequences.get(column).ok_or_else(|| {
                    FeatureError::Internal(format!("column '{}' missing after validation", column))
                })
            })
            .collect::<Result<Vec<&TimeSequence>>>()?;

        let mut segmenter = Segmenter::new(inputs, self.primary, &self.window, default_min_occupancy)
            .map_err(|e| FeatureError::Internal(format!("segmenting {:?}: {}", self.inputs, e)))?;

        let mut items = Vec::new();
        for segment in segmenter.by_ref() {
            for &descriptor in &self.members {
                items.push(WorkItem {
                    descriptor,
                    window: segment.window,
                    slices: segment.slices.clone(),
                });
            }
        }

        let stats = segmenter.stats();
        debug!(
            "Segmented {} with {}: {} windows, {} dropped",
            self.inputs.join("|"),
            self.window,
            stats.segments(),
            stats.dropped()
        );
        Ok((items, stats))
    }
}

/// Work items of a single descriptor.
///
/// `position` tags the items with the descriptor's place in its collection.
pub fn segment<'a>(
    position: usize,
    descriptor: &FeatureDescriptor,
    sequences: &'a SequenceSet,
    default_min_occupancy: usize,
) -> Result<Vec<WorkItem<'a>>> {
    let group = DescriptorGroup {
        inputs: descriptor.inputs().to_vec(),
        window: *descriptor.window(),
        primary: descriptor.primary_position().unwrap_or(0),
        members: vec![position],
    };
    let (items, _) = group.segment(sequences, default_min_occupancy)?;
    Ok(items)
}

/// Log a gapped duration windowing unless the caller approved sparse input
pub(crate) fn report_sparsity(group: &DescriptorGroup, stats: &SegmentStats, approved: bool) -> bool {
    if !stats.windows.has_gaps() {
        return false;
    }
    if !approved {
        warn!(
            "There are gaps in the time-series {}; {} windows hold between {} and {} samples",
            group.inputs.join("|"),
            group.window,
            stats.windows.interior_min.unwrap_or(0),
            stats.windows.interior_max.unwrap_or(0)
        );
    }
    true
}
