//! Output Table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use time_sequence::{IndexKind, Timestamp};

/// One named result column; `None` marks an absent cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Timestamp-indexed result table, rows strictly ordered by timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTable {
    kind: IndexKind,
    index: Vec<Timestamp>,
    columns: Vec<Column>,
}

impl OutputTable {
    pub(crate) fn new(kind: IndexKind, index: Vec<Timestamp>, columns: Vec<Column>) -> Self {
        Self {
            kind,
            index,
            columns,
        }
    }

    /// Kind of the timestamp axis
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Row timestamps
    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    /// Row timestamps as instants, for wall-clock tables
    pub fn datetimes(&self) -> Option<Vec<DateTime<Utc>>> {
        match self.kind {
            IndexKind::WallClock => Some(self.index.iter().map(|ts| ts.to_datetime()).collect()),
            IndexKind::Offset => None,
        }
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cell at a timestamp; `None` if the row, column or value is absent
    pub fn get(&self, name: &str, ts: Timestamp) -> Option<f64> {
        let row = self.index.binary_search(&ts).ok()?;
        self.column(name)?.values[row]
    }

    /// Values of one row, in column order
    pub fn row(&self, position: usize) -> Option<(Timestamp, Vec<Option<f64>>)> {
        let ts = *self.index.get(position)?;
        Some((ts, self.columns.iter().map(|c| c.values[position]).collect()))
    }
}
