use tracing::warn;

use crate::constants::columns::{
    LONG_ENTITY_GROUP, LONG_ENTITY_ID, LONG_KEYWORD, LONG_RAW_SCORE, TRENDS_DATE,
    TRENDS_PROVINCE_CODE, TRENDS_REGION,
};
use crate::data::RawObservation;
use crate::errors::PipelineError;
use crate::source::RawTable;
use crate::source::parsing::ParsedRows;
use crate::source::parsing::date_helpers::parse_iso_date;
use crate::types::Keyword;
use crate::utils::parse_numeric;

/// Parse observations, detecting long form by its `keyword` + `raw_score` columns.
///
/// Anything else is treated as the wide export with one column per keyword.
pub fn parse_observations(
    table: &RawTable,
    keywords: &[Keyword],
) -> Result<ParsedRows<RawObservation>, PipelineError> {
    let is_long = table.column_index(LONG_KEYWORD).is_some()
        && table.column_index(LONG_RAW_SCORE).is_some();
    if is_long {
        parse_long(table)
    } else {
        parse_wide(table, keywords)
    }
}

/// Melt a wide export (`date, province_code, [region7], <keyword>...`) to long rows.
///
/// Keyword columns missing from the header are skipped with a warning; a table
/// with none of them is malformed. Empty or non-numeric score cells become
/// `raw_score: None` rather than dropping the row, so the normalizer decides.
pub fn parse_wide(
    table: &RawTable,
    keywords: &[Keyword],
) -> Result<ParsedRows<RawObservation>, PipelineError> {
    let date_col = table.require_column(TRENDS_DATE)?;
    let entity_col = table.require_column(TRENDS_PROVINCE_CODE)?;
    let group_col = table.column_index(TRENDS_REGION);

    let mut keyword_cols = Vec::new();
    for keyword in keywords {
        match table.column_index(keyword) {
            Some(idx) => keyword_cols.push((keyword.as_str(), idx)),
            None => warn!(
                "[shock_response:source] source '{}' has no column for keyword '{}'",
                table.source_id(),
                keyword
            ),
        }
    }
    if keyword_cols.is_empty() {
        return Err(PipelineError::malformed(
            table.source_id(),
            format!(
                "none of the keyword columns [{}] are present",
                keywords.join(", ")
            ),
        ));
    }

    let rows = table.rows().iter().map(|row| {
        let date = parse_iso_date(RawTable::cell(row, date_col))?;
        let entity_id = RawTable::cell(row, entity_col);
        if entity_id.is_empty() {
            return None;
        }
        let entity_group = group_col
            .map(|idx| RawTable::cell(row, idx))
            .filter(|group| !group.is_empty())
            .map(str::to_string);
        Some(
            keyword_cols
                .iter()
                .map(|(keyword, idx)| RawObservation {
                    date,
                    entity_id: entity_id.to_string(),
                    entity_group: entity_group.clone(),
                    keyword: keyword.to_string(),
                    raw_score: parse_numeric(RawTable::cell(row, *idx)),
                })
                .collect::<Vec<_>>(),
        )
    });
    let parsed = ParsedRows::collect(table, "date and entity", rows)?;
    Ok(ParsedRows {
        records: parsed.records.into_iter().flatten().collect(),
        skipped: parsed.skipped,
    })
}

/// Parse long rows (`date, entity_id, [entity_group], keyword, raw_score`).
pub fn parse_long(table: &RawTable) -> Result<ParsedRows<RawObservation>, PipelineError> {
    let date_col = table.require_column(TRENDS_DATE)?;
    let entity_col = table.require_column(LONG_ENTITY_ID)?;
    let keyword_col = table.require_column(LONG_KEYWORD)?;
    let score_col = table.require_column(LONG_RAW_SCORE)?;
    let group_col = table.column_index(LONG_ENTITY_GROUP);

    let rows = table.rows().iter().map(|row| {
        let date = parse_iso_date(RawTable::cell(row, date_col))?;
        let entity_id = RawTable::cell(row, entity_col);
        let keyword = RawTable::cell(row, keyword_col);
        if entity_id.is_empty() || keyword.is_empty() {
            return None;
        }
        Some(RawObservation {
            date,
            entity_id: entity_id.to_string(),
            entity_group: group_col
                .map(|idx| RawTable::cell(row, idx))
                .filter(|group| !group.is_empty())
                .map(str::to_string),
            keyword: keyword.to_string(),
            raw_score: parse_numeric(RawTable::cell(row, score_col)),
        })
    });
    ParsedRows::collect(table, "date, entity, and keyword", rows)
}
