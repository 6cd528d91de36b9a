//! Input table interfaces and typed row parsing.
//!
//! Ownership model:
//! - `TableSource` is the pipeline-facing interface that yields one raw table.
//! - `RawTable` is a header plus string rows; it knows nothing about semantics.
//! - `parsing` turns a `RawTable` into typed records, dropping rows that fail
//!   to parse and escalating only structural failures (missing columns, no
//!   usable rows at all).

use crate::errors::PipelineError;
use crate::types::{CellValue, ColumnName, SourceId};

/// Typed row parsers for each supported input table.
pub mod parsing;
/// Utility helpers used by pipeline stages.
pub mod utilities;

/// Header-addressed table of raw cell text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    source_id: SourceId,
    columns: Vec<ColumnName>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Create a table from owned header and row data.
    pub fn new(
        source_id: impl Into<SourceId>,
        columns: Vec<ColumnName>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            columns,
            rows,
        }
    }

    /// Convenience constructor from borrowed string slices.
    pub fn from_str_rows<R>(source_id: impl Into<SourceId>, columns: &[&str], rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<[&'static str]>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.as_ref().iter().map(|cell| cell.to_string()).collect())
            .collect();
        Self::new(
            source_id,
            columns.iter().map(|column| column.to_string()).collect(),
            rows,
        )
    }

    /// Identifier used in errors and log lines.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Header names in file order.
    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    /// Data rows (header excluded).
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header, matched after trimming.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.trim() == name)
    }

    /// Position of `name` in the header, or `MalformedInput` when absent.
    pub fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name).ok_or_else(|| {
            PipelineError::malformed(
                self.source_id.clone(),
                format!(
                    "required column '{}' is absent (found: {})",
                    name,
                    self.columns.join(", ")
                ),
            )
        })
    }

    /// Cell text at `column` in `row`; short rows read as empty cells.
    pub fn cell<'a>(row: &'a [CellValue], column: usize) -> &'a str {
        row.get(column).map(|value| value.trim()).unwrap_or("")
    }
}

/// Pipeline-facing provider of one input table.
///
/// Implementations may read from disk or hold the table in memory. A failure
/// to load is reported per source so sibling sources can still contribute.
pub trait TableSource: Send + Sync {
    /// Stable source identifier used in errors and log lines.
    fn id(&self) -> &str;
    /// Materialize the table.
    fn load(&self) -> Result<RawTable, PipelineError>;
}

/// Table source backed by an already-loaded table.
#[derive(Clone, Debug)]
pub struct InMemorySource {
    table: RawTable,
}

impl InMemorySource {
    /// Wrap a loaded table.
    pub fn new(table: RawTable) -> Self {
        Self { table }
    }
}

impl TableSource for InMemorySource {
    fn id(&self) -> &str {
        self.table.source_id()
    }

    fn load(&self) -> Result<RawTable, PipelineError> {
        Ok(self.table.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_column_reports_missing_header() {
        let table = RawTable::from_str_rows("prices", &["Date", "Open"], [["01/02/2024", "30.1"]]);
        assert_eq!(table.require_column("Date").unwrap(), 0);
        let err = table.require_column("Price").unwrap_err();
        match err {
            PipelineError::MalformedInput { source_id, details } => {
                assert_eq!(source_id, "prices");
                assert!(details.contains("'Price'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cell_reads_short_rows_as_empty() {
        let row = vec!["a".to_string()];
        assert_eq!(RawTable::cell(&row, 0), "a");
        assert_eq!(RawTable::cell(&row, 3), "");
    }

    #[test]
    fn column_lookup_ignores_surrounding_whitespace() {
        let table = RawTable::from_str_rows("t", &[" Date ", "Price"], Vec::<[&str; 2]>::new());
        assert_eq!(table.column_index("Date"), Some(0));
        assert!(table.is_empty());
    }

    #[test]
    fn in_memory_source_returns_its_table() {
        let table = RawTable::from_str_rows("trends", &["date"], [["2024-01-01"]]);
        let source = InMemorySource::new(table.clone());
        assert_eq!(source.id(), "trends");
        assert_eq!(source.load().unwrap(), table);
    }
}
