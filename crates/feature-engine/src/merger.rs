//! Result Merger
//!
//! Aligns per-descriptor results, each on its own cadence, onto one index.
//! Cells a descriptor did not produce stay absent; nothing is interpolated
//! or carried forward.

use crate::table::{Column, OutputTable};
use crate::{FeatureDescriptor, FeatureError, ResultRow, Result};
use std::collections::{BTreeSet, HashSet};
use time_sequence::{IndexKind, Timestamp};

/// Merge every descriptor's rows into one table.
///
/// The index is the sorted union of the timestamps of descriptors that
/// produced at least one value. Columns follow descriptor declaration order.
pub fn merge(
    descriptors: &[FeatureDescriptor],
    results: &[Vec<ResultRow>],
    kind: IndexKind,
) -> Result<OutputTable> {
    check_shape(descriptors, results)?;

    let index: Vec<Timestamp> = results
        .iter()
        .filter(|rows| has_values(rows))
        .flat_map(|rows| rows.iter().map(|row| row.timestamp))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut names = HashSet::new();
    let mut columns = Vec::new();
    for (descriptor, rows) in descriptors.iter().zip(results) {
        for (output, name) in descriptor.output_names().into_iter().enumerate() {
            if !names.insert(name.clone()) {
                return Err(FeatureError::Internal(format!(
                    "output column '{}' reached the merger twice",
                    name
                )));
            }
            columns.push(align(name, output, rows, &index)?);
        }
    }

    Ok(OutputTable::new(kind, index, columns))
}

/// One table per descriptor, each on the descriptor's own timestamps
pub fn split(
    descriptors: &[FeatureDescriptor],
    results: &[Vec<ResultRow>],
    kind: IndexKind,
) -> Result<Vec<OutputTable>> {
    check_shape(descriptors, results)?;

    descriptors
        .iter()
        .zip(results)
        .map(|(descriptor, rows)| {
            let index: Vec<Timestamp> = rows.iter().map(|row| row.timestamp).collect();
            let columns = descriptor
                .output_names()
                .into_iter()
                .enumerate()
                .map(|(output, name)| align(name, output, rows, &index))
                .collect::<Result<Vec<_>>>()?;
            Ok(OutputTable::new(kind, index, columns))
        })
        .collect()
}

fn check_shape(descriptors: &[FeatureDescriptor], results: &[Vec<ResultRow>]) -> Result<()> {
    if descriptors.len() != results.len() {
        return Err(FeatureError::Internal(format!(
            "{} result series for {} descriptors",
            results.len(),
            descriptors.len()
        )));
    }
    Ok(())
}

fn has_values(rows: &[ResultRow]) -> bool {
    rows.iter().any(|row| row.values.iter().any(Option::is_some))
}

/// Place output `output` of sorted `rows` onto `index`
fn align(name: String, output: usize, rows: &[ResultRow], index: &[Timestamp]) -> Result<Column> {
    let mut values = vec![None; index.len()];
    if !has_values(rows) {
        return Ok(Column { name, values });
    }

    let mut previous: Option<Timestamp> = None;
    for row in rows {
        if previous.is_some_and(|ts| ts >= row.timestamp) {
            return Err(FeatureError::Internal(format!(
                "column '{}' has unordered or repeated timestamp {}",
                name, row.timestamp
            )));
        }
        previous = Some(row.timestamp);

        let position = index.binary_search(&row.timestamp).map_err(|_| {
            FeatureError::Internal(format!("timestamp {} missing from merged index", row.timestamp))
        })?;
        values[position] = row.values.get(output).copied().flatten();
    }

    Ok(Column { name, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use window_functions::{Statistic, Statistics};
    use windowing::{Window, WindowSpec};

    fn descriptor(column: &str) -> FeatureDescriptor {
        FeatureDescriptor::new(Statistics::single(Statistic::Mean), [column], WindowSpec::samples(2, 2))
    }

    fn row(ts: i64, value: Option<f64>) -> ResultRow {
        ResultRow {
            timestamp: Timestamp(ts),
            window: Window {
                start: Timestamp(ts - 2),
                end: Timestamp(ts),
            },
            values: vec![value],
        }
    }

    #[test]
    fn test_union_index_with_absent_cells() {
        let descriptors = vec![descriptor("a"), descriptor("b")];
        let results = vec![
            vec![row(2, Some(1.0)), row(4, Some(2.0))],
            vec![row(3, Some(5.0)), row(4, None)],
        ];
        let table = merge(&descriptors, &results, IndexKind::Offset).unwrap();

        assert_eq!(table.index(), &[Timestamp(2), Timestamp(3), Timestamp(4)]);
        assert_eq!(table.columns()[0].values, vec![Some(1.0), None, Some(2.0)]);
        assert_eq!(table.columns()[1].values, vec![None, Some(5.0), None]);
    }

    #[test]
    fn test_all_absent_descriptor_adds_no_rows() {
        let descriptors = vec![descriptor("a"), descriptor("b")];
        let results = vec![vec![row(2, Some(1.0))], vec![row(9, None)]];
        let table = merge(&descriptors, &results, IndexKind::Offset).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.columns()[1].values, vec![None]);
    }

    #[test]
    fn test_collision_is_internal_error() {
        let descriptors = vec![descriptor("a"), descriptor("a")];
        let results = vec![vec![row(2, Some(1.0))], vec![row(2, Some(1.0))]];
        assert!(matches!(
            merge(&descriptors, &results, IndexKind::Offset),
            Err(FeatureError::Internal(_))
        ));
    }

    #[test]
    fn test_unsorted_rows_rejected() {
        let descriptors = vec![descriptor("a")];
        let results = vec![vec![row(4, Some(1.0)), row(2, Some(1.0))]];
        assert!(matches!(
            merge(&descriptors, &results, IndexKind::Offset),
            Err(FeatureError::Internal(_))
        ));
    }

    #[test]
    fn test_split_keeps_own_cadence() {
        let descriptors = vec![descriptor("a"), descriptor("b")];
        let results = vec![vec![row(2, Some(1.0))], vec![row(3, None), row(5, Some(2.0))]];
        let tables = split(&descriptors, &results, IndexKind::Offset).unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 1);
        assert_eq!(tables[1].index(), &[Timestamp(3), Timestamp(5)]);
        assert_eq!(tables[1].columns()[0].values, vec![None, Some(2.0)]);
    }
}
