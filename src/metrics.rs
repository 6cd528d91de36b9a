use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::{PanelRow, RegionalIndex};
use crate::utils::{mean, population_std};

/// Key used to group panel deltas for summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaGrouping {
    /// One summary per region.
    Region,
    /// One summary per event type.
    EventType,
}

/// Descriptive statistics for one group of deltas.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeltaSummary {
    pub key: String,
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-group delta summaries plus the rows left out for a missing delta.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeltaSummaries {
    pub groups: Vec<DeltaSummary>,
    pub excluded: usize,
}

/// Summarize complete deltas per group, sorted by key.
///
/// Groups whose deltas are all missing do not get a summary.
pub fn summarize_deltas(panel: &[PanelRow], grouping: DeltaGrouping) -> DeltaSummaries {
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut excluded = 0usize;
    for row in panel {
        let Some(delta) = row.delta.filter(|delta| delta.is_finite()) else {
            excluded += 1;
            continue;
        };
        let key = match grouping {
            DeltaGrouping::Region => row.entity_group.clone(),
            DeltaGrouping::EventType => row.event_type.as_str().to_string(),
        };
        grouped.entry(key).or_default().push(delta);
    }
    let groups = grouped
        .into_iter()
        .filter_map(|(key, values)| {
            Some(DeltaSummary {
                count: values.len(),
                mean: mean(&values)?,
                std: population_std(&values)?,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                key,
            })
        })
        .collect();
    DeltaSummaries { groups, excluded }
}

/// Overview of a regional index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexSummary {
    pub rows: usize,
    pub regions: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Describe an index; `None` when it has no rows.
pub fn describe_index(index: &RegionalIndex) -> Option<IndexSummary> {
    let (first_date, last_date) = index.date_span()?;
    let values: Vec<f64> = index.rows().iter().map(|row| row.stress_index).collect();
    Some(IndexSummary {
        rows: index.len(),
        regions: index.groups().len(),
        first_date,
        last_date,
        mean: mean(&values)?,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EventType, RegionalIndexRow};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    fn row(event_type: EventType, group: &str, delta: Option<f64>) -> PanelRow {
        PanelRow {
            event_date: date(1),
            event_type,
            entity_group: group.to_string(),
            pre_mean: Some(0.0),
            post_mean: delta,
            delta,
        }
    }

    fn panel() -> Vec<PanelRow> {
        vec![
            row(EventType::Earthquake, "West", Some(1.0)),
            row(EventType::Earthquake, "East", Some(2.0)),
            row(EventType::FxShock, "East", Some(4.0)),
            row(EventType::FxShock, "West", None),
            row(EventType::FxShock, "North", None),
        ]
    }

    #[test]
    fn summaries_by_region_are_sorted_and_skip_missing() {
        let summaries = summarize_deltas(&panel(), DeltaGrouping::Region);
        assert_eq!(summaries.excluded, 2);
        let keys: Vec<&str> = summaries.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["East", "West"]);
        let east = &summaries.groups[0];
        assert_eq!(east.count, 2);
        assert_eq!(east.mean, 3.0);
        assert_eq!(east.std, 1.0);
        assert_eq!(east.min, 2.0);
        assert_eq!(east.max, 4.0);
    }

    #[test]
    fn summaries_by_event_type_use_output_labels() {
        let summaries = summarize_deltas(&panel(), DeltaGrouping::EventType);
        let keys: Vec<&str> = summaries.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["earthquake", "fx_shock"]);
        assert_eq!(summaries.groups[0].mean, 1.5);
        assert_eq!(summaries.groups[1].count, 1);
    }

    #[test]
    fn describe_index_reports_span_and_range() {
        assert_eq!(describe_index(&RegionalIndex::default()), None);
        let index = RegionalIndex::from_rows(vec![
            RegionalIndexRow {
                date: date(3),
                entity_group: "East".to_string(),
                stress_index: -1.0,
            },
            RegionalIndexRow {
                date: date(1),
                entity_group: "West".to_string(),
                stress_index: 2.0,
            },
        ]);
        let summary = describe_index(&index).unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.regions, 2);
        assert_eq!(summary.first_date, date(1));
        assert_eq!(summary.last_date, date(3));
        assert_eq!(summary.mean, 0.5);
        assert_eq!(summary.min, -1.0);
        assert_eq!(summary.max, 2.0);
    }
}
