use crate::constants::columns::{QUAKE_DEPTH, QUAKE_MAGNITUDE, SOURCE_DATE};
use crate::data::SeismicRecord;
use crate::errors::PipelineError;
use crate::source::RawTable;
use crate::source::parsing::ParsedRows;
use crate::source::parsing::date_helpers::parse_day_first_timestamp;
use crate::utils::parse_numeric;

/// Parse a seismic catalog with `Date` (day-first), `Magnitude`, and `Depth` columns.
///
/// Rows whose timestamp, magnitude, or depth fails to parse are dropped and
/// counted; extra catalog columns are ignored.
pub fn parse_seismic_catalog(
    table: &RawTable,
) -> Result<ParsedRows<SeismicRecord>, PipelineError> {
    let date_col = table.require_column(SOURCE_DATE)?;
    let magnitude_col = table.require_column(QUAKE_MAGNITUDE)?;
    let depth_col = table.require_column(QUAKE_DEPTH)?;

    let rows = table.rows().iter().map(|row| {
        Some(SeismicRecord {
            timestamp: parse_day_first_timestamp(RawTable::cell(row, date_col))?,
            magnitude: parse_numeric(RawTable::cell(row, magnitude_col))?,
            depth_km: parse_numeric(RawTable::cell(row, depth_col))?,
        })
    });
    ParsedRows::collect(table, "timestamp, magnitude, and depth", rows)
}
