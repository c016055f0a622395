//! Named Collection of Sequences

use crate::{IndexKind, SequenceError, TimeSequence, Timestamp};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mapping from column name to sequence, as handed to the extraction core
#[derive(Debug, Clone, Default)]
pub struct SequenceSet {
    sequences: BTreeMap<String, TimeSequence>,
}

impl SequenceSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from several columns recorded on one shared axis
    pub fn from_frame<S: Into<String>>(
        kind: IndexKind,
        index: Vec<Timestamp>,
        columns: impl IntoIterator<Item = (S, Vec<Option<f64>>)>,
    ) -> Result<Self, SequenceError> {
        let index: Arc<[Timestamp]> = index.into();
        let mut set = Self::new();
        for (name, values) in columns {
            set.insert(TimeSequence::new(name, kind, Arc::clone(&index), values)?)?;
        }
        Ok(set)
    }

    /// Add a sequence; names must be unique
    pub fn insert(&mut self, sequence: TimeSequence) -> Result<(), SequenceError> {
        if self.sequences.contains_key(sequence.name()) {
            return Err(SequenceError::DuplicateName(sequence.name().to_string()));
        }
        self.sequences.insert(sequence.name().to_string(), sequence);
        Ok(())
    }

    /// Builder-style insert
    pub fn with(mut self, sequence: TimeSequence) -> Result<Self, SequenceError> {
        self.insert(sequence)?;
        Ok(self)
    }

    /// Look up a sequence by name
    pub fn get(&self, name: &str) -> Option<&TimeSequence> {
        self.sequences.get(name)
    }

    /// Check if a sequence is present
    pub fn contains(&self, name: &str) -> bool {
        self.sequences.contains_key(name)
    }

    /// Sequence names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    /// Iterate sequences in name order
    pub fn iter(&self) -> impl Iterator<Item = &TimeSequence> {
        self.sequences.values()
    }

    /// Number of sequences
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_rejected() {
        let mut set = SequenceSet::new();
        set.insert(TimeSequence::offsets("a", vec![0], vec![1.0]).unwrap()).unwrap();
        let err = set
            .insert(TimeSequence::offsets("a", vec![0], vec![2.0]).unwrap())
            .unwrap_err();
        assert_eq!(err, SequenceError::DuplicateName("a".to_string()));
    }

    #[test]
    fn test_frame_shares_index() {
        let index = vec![Timestamp(0), Timestamp(1)];
        let set = SequenceSet::from_frame(
            IndexKind::Offset,
            index,
            vec![("x", vec![Some(1.0), None]), ("y", vec![Some(3.0), Some(4.0)])],
        )
        .unwrap();

        let x = set.get("x").unwrap();
        let y = set.get("y").unwrap();
        assert!(Arc::ptr_eq(&x.shared_index(), &y.shared_index()));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
