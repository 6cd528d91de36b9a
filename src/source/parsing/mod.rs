/// Date parsing and day-shift helpers.
pub mod date_helpers;
/// Currency price series rows.
pub mod prices;
/// Seismic catalog rows.
pub mod seismic;
/// Keyword search-interest observations (wide or long form).
pub mod trends;

use tracing::{debug, warn};

use crate::errors::PipelineError;
use crate::source::RawTable;

/// Typed rows parsed from one table plus the count of rows dropped on the way.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRows<T> {
    /// Rows that parsed successfully, in table order.
    pub records: Vec<T>,
    /// Rows dropped because a required cell failed to parse.
    pub skipped: usize,
}

impl<T> ParsedRows<T> {
    /// Collect per-row parse results, dropping failures.
    ///
    /// A non-empty table in which every row failed is structurally unusable
    /// and escalates as `MalformedInput`.
    pub(crate) fn collect(
        table: &RawTable,
        what: &str,
        rows: impl IntoIterator<Item = Option<T>>,
    ) -> Result<Self, PipelineError> {
        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            match row {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }
        if records.is_empty() && skipped > 0 {
            return Err(PipelineError::malformed(
                table.source_id(),
                format!("none of the {skipped} rows contained a usable {what}"),
            ));
        }
        if skipped > 0 {
            warn!(
                "[shock_response:source] source '{}' dropped {} of {} rows with an unusable {}",
                table.source_id(),
                skipped,
                skipped + records.len(),
                what
            );
        } else {
            debug!(
                "[shock_response:source] source '{}' parsed {} rows",
                table.source_id(),
                records.len()
            );
        }
        Ok(Self { records, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_counts_skipped_rows() {
        let table = RawTable::from_str_rows("t", &["x"], [["1"], ["bad"], ["3"]]);
        let parsed = ParsedRows::collect(
            &table,
            "value",
            table
                .rows()
                .iter()
                .map(|row| RawTable::cell(row, 0).parse::<i32>().ok()),
        )
        .unwrap();
        assert_eq!(parsed.records, vec![1, 3]);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn collect_rejects_tables_where_every_row_fails() {
        let table = RawTable::from_str_rows("t", &["x"], [["bad"], ["worse"]]);
        let result = ParsedRows::<i32>::collect(
            &table,
            "value",
            table
                .rows()
                .iter()
                .map(|row| RawTable::cell(row, 0).parse::<i32>().ok()),
        );
        assert!(matches!(
            result,
            Err(PipelineError::MalformedInput { .. })
        ));
    }

    #[test]
    fn collect_accepts_empty_tables() {
        let table = RawTable::from_str_rows("t", &["x"], Vec::<[&str; 1]>::new());
        let parsed = ParsedRows::<i32>::collect(&table, "value", Vec::new()).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped, 0);
    }
}
