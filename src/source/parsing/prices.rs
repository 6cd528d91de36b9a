use crate::constants::columns::{PRICE_CLOSE, SOURCE_DATE};
use crate::data::PricePoint;
use crate::errors::PipelineError;
use crate::source::RawTable;
use crate::source::parsing::ParsedRows;
use crate::source::parsing::date_helpers::parse_month_first_timestamp;

/// Parse a price series with `Date` (month-first) and `Price` columns.
///
/// Rows with unparseable dates are dropped here. The price cell is kept as
/// text; numeric coercion belongs to the return-shock rule.
pub fn parse_price_series(table: &RawTable) -> Result<ParsedRows<PricePoint>, PipelineError> {
    let date_col = table.require_column(SOURCE_DATE)?;
    let price_col = table.require_column(PRICE_CLOSE)?;

    let rows = table.rows().iter().map(|row| {
        Some(PricePoint {
            timestamp: parse_month_first_timestamp(RawTable::cell(row, date_col))?,
            price: RawTable::cell(row, price_col).to_string(),
        })
    });
    ParsedRows::collect(table, "timestamp", rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_month_first_rows_and_keeps_price_text() {
        let table = RawTable::from_str_rows(
            "prices",
            &["Date", "Price", "Open", "Change %"],
            [
                ["11/23/2025", "42.35", "42.30", "0.12%"],
                ["11/22/2025", "n/a", "42.10", "-"],
                ["22/11/2025", "42.00", "42.00", "0%"],
            ],
        );
        let parsed = parse_price_series(&table).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(
            parsed.records[0].timestamp.date(),
            NaiveDate::from_ymd_opt(2025, 11, 23).unwrap()
        );
        assert_eq!(parsed.records[1].price, "n/a");
    }

    #[test]
    fn missing_price_column_is_malformed() {
        let table = RawTable::from_str_rows("prices", &["Date", "Close"], [["11/23/2025", "1"]]);
        assert!(matches!(
            parse_price_series(&table),
            Err(PipelineError::MalformedInput { .. })
        ));
    }
}
